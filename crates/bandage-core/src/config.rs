//! Session configuration.
//!
//! Identifiers are fixed constants for this deployment but are carried as
//! configuration so the state machine never hard-codes them.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use bandage_core::SessionConfig;
//!
//! let config = SessionConfig::default()
//!     .history_capacity(20)
//!     .discovery_timeout(Duration::from_secs(15));
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bandage_types::uuid::{DEVICE_NAME, NOTIFY_CHARACTERISTIC, UART_SERVICE, WRITE_CHARACTERISTIC};

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::thresholds::ThresholdConfig;

/// Configuration for a device session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Advertised name of the device to connect to (exact match).
    pub device_name: String,
    /// Service carrying telemetry and commands.
    pub service_uuid: Uuid,
    /// Characteristic delivering telemetry notifications.
    pub notify_uuid: Uuid,
    /// Characteristic accepting command writes.
    pub write_uuid: Uuid,
    /// Values kept per metric.
    pub history_capacity: usize,
    /// Capacity of the consumer event broadcast channel.
    pub event_capacity: usize,
    /// Capacity of the consumer command queue.
    pub command_capacity: usize,
    /// Give up on service/characteristic discovery after this long.
    ///
    /// `None` (default) leaves a stalled discovery parked indefinitely.
    pub discovery_timeout: Option<Duration>,
    /// Surface an error after this many malformed frames in a row.
    ///
    /// `None` (default) discards malformed frames silently.
    pub max_consecutive_malformed: Option<u32>,
    /// Status band thresholds.
    pub thresholds: ThresholdConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            service_uuid: UART_SERVICE,
            notify_uuid: NOTIFY_CHARACTERISTIC,
            write_uuid: WRITE_CHARACTERISTIC,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            event_capacity: 100,
            command_capacity: 16,
            discovery_timeout: None,
            max_consecutive_malformed: None,
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new session config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target device name.
    #[must_use]
    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Set the per-metric history capacity.
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the event broadcast capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set the discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = Some(timeout);
        self
    }

    /// Set the malformed-frame escalation limit.
    #[must_use]
    pub fn max_consecutive_malformed(mut self, max: u32) -> Self {
        self.max_consecutive_malformed = Some(max);
        self
    }

    /// Set the status band thresholds.
    #[must_use]
    pub fn thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Validate the configuration.
    ///
    /// Checks that:
    /// - `history_capacity` is > 0
    /// - `event_capacity` and `command_capacity` are > 0
    /// - `device_name` is not empty
    /// - `max_consecutive_malformed`, when set, is > 0
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(Error::invalid_config("history_capacity must be > 0"));
        }
        if self.event_capacity == 0 {
            return Err(Error::invalid_config("event_capacity must be > 0"));
        }
        if self.command_capacity == 0 {
            return Err(Error::invalid_config("command_capacity must be > 0"));
        }
        if self.device_name.is_empty() {
            return Err(Error::invalid_config("device_name must not be empty"));
        }
        if self.max_consecutive_malformed == Some(0) {
            return Err(Error::invalid_config(
                "max_consecutive_malformed must be > 0",
            ));
        }
        Ok(())
    }
}
