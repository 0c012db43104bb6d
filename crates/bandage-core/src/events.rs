//! Event types flowing into and out of the session loop.
//!
//! - [`AdapterEvent`]: pushed by a [`RadioAdapter`](crate::RadioAdapter)
//!   into an `mpsc` channel; the session loop is the only consumer.
//! - [`SessionEvent`]: broadcast by the session loop to any number of
//!   consumers (dashboards, alert logic).

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use bandage_types::{Command, SessionState};

use crate::adapter::{CharHandle, CharacteristicMap, DeviceId, ServiceHandle};
use crate::error::SessionError;
use crate::thresholds::StatusBand;

/// Events reported by a radio adapter.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AdapterEvent {
    /// The radio was powered on or off.
    AdapterStateChanged { available: bool },
    /// An advertisement was seen while scanning.
    DeviceDiscovered {
        device: DeviceId,
        name: Option<String>,
    },
    /// A connection attempt succeeded.
    Connected { device: DeviceId },
    /// A connection attempt failed.
    ConnectFailed { device: DeviceId, reason: String },
    /// The link to a device went down.
    Disconnected {
        device: DeviceId,
        reason: DisconnectReason,
    },
    /// The requested service exists on the device.
    ServiceDiscovered { service: ServiceHandle },
    /// Service discovery finished without the requested service.
    ServiceNotFound { device: DeviceId, uuid: Uuid },
    /// Characteristic discovery finished; `found` holds the matches.
    CharacteristicsDiscovered {
        service: ServiceHandle,
        found: CharacteristicMap,
    },
    /// Service or characteristic discovery errored out.
    DiscoveryFailed { device: DeviceId, reason: String },
    /// A subscribed characteristic changed value.
    Notification {
        characteristic: CharHandle,
        value: Vec<u8>,
    },
    /// A write-with-response finished.
    WriteCompleted {
        characteristic: CharHandle,
        result: std::result::Result<(), String>,
    },
}

/// Reason for disconnection.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DisconnectReason {
    /// Normal disconnection requested by the user.
    UserRequested,
    /// The device or the platform dropped the link.
    Remote,
    /// BLE error occurred.
    BleError(String),
    /// Unknown reason.
    Unknown,
}

/// Sender half of the adapter event channel.
pub type AdapterEventSender = mpsc::Sender<AdapterEvent>;

/// Receiver half of the adapter event channel.
pub type AdapterEventReceiver = mpsc::Receiver<AdapterEvent>;

/// Create an adapter event channel with the given capacity.
pub fn adapter_channel(capacity: usize) -> (AdapterEventSender, AdapterEventReceiver) {
    mpsc::channel(capacity)
}

/// Create a default adapter event channel with capacity 64.
pub fn default_adapter_channel() -> (AdapterEventSender, AdapterEventReceiver) {
    adapter_channel(64)
}

/// Events emitted by the session loop.
///
/// All events are serializable for logging and IPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum SessionEvent {
    /// The state machine moved.
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    /// A frame decoded successfully, with the bands of its two values.
    Telemetry {
        temperature: f64,
        humidity: f64,
        temperature_band: StatusBand,
        humidity_band: StatusBand,
    },
    /// A command was handed to the adapter.
    CommandSent { command: Command },
    /// The device acknowledged a command write.
    CommandAcknowledged,
    /// The device did not acknowledge a command write.
    WriteFailed { reason: String },
    /// A session-level error was surfaced.
    Error { error: SessionError },
}

/// Receiver for session events.
pub type SessionEventReceiver = broadcast::Receiver<SessionEvent>;

/// Event dispatcher for sending session events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> SessionEventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: SessionEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
