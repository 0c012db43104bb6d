//! Device session manager for the Smart Bandage wireless sensor.
//!
//! This crate discovers a single named peripheral over Bluetooth Low Energy,
//! walks it through connection and GATT discovery, decodes its periodic
//! temperature/humidity notifications into bounded histories, classifies
//! the latest values into status bands and sends actuator commands back.
//!
//! # Features
//!
//! - **Session state machine**: scan, connect, discover, subscribe, stream
//! - **Telemetry codec**: `"<temperature>,<humidity>\n"` frames
//! - **Bounded history**: fixed-size rolling window per metric
//! - **Status bands**: fixed threshold classification, no hysteresis
//! - **Actuator commands**: `ON` / `OFF` motor control
//! - **Pluggable radio**: btleplug for hardware, a mock for tests
//!
//! # Architecture
//!
//! The radio adapter reports every outcome as an [`AdapterEvent`] on an
//! `mpsc` channel. A [`SessionManager`] drains that channel and consumer
//! requests serially, so session state has a single writer. Consumers read
//! immutable [`SessionSnapshot`]s from a `watch` channel and may subscribe
//! to a broadcast of [`SessionEvent`]s.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use bandage_core::events::default_adapter_channel;
//! use bandage_core::{BtleplugAdapter, Command, SessionConfig, SessionManager, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, rx) = default_adapter_channel();
//!     let adapter = Arc::new(BtleplugAdapter::new(tx).await?);
//!     let session = SessionManager::new(adapter, SessionConfig::default())?.spawn(rx);
//!
//!     session.start_session().await?;
//!     session
//!         .wait_for_state(SessionState::Ready, Duration::from_secs(30))
//!         .await?;
//!     session.send_command(Command::MotorOn).await?;
//!
//!     let snapshot = session.snapshot();
//!     println!("{:?} / {:?}", snapshot.temperature, snapshot.humidity);
//!     session.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod btle;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod mock;
pub mod session;
pub mod thresholds;

// Re-export types
pub use bandage_types::types;
pub use bandage_types::uuid;

// Re-export core types
pub use adapter::{CharHandle, CharacteristicMap, DeviceId, RadioAdapter, ServiceHandle};
pub use btle::BtleplugAdapter;
pub use config::SessionConfig;
pub use error::{Error, Result, SessionError};
pub use events::{AdapterEvent, DisconnectReason, EventDispatcher, SessionEvent};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryBuffer, HistorySnapshot, TelemetryHistory};
pub use mock::{AdapterCall, MockAdapter, MockAdapterBuilder};
pub use session::{DeviceHandle, SessionHandle, SessionManager, SessionSnapshot};
pub use thresholds::{StatusBand, ThresholdConfig, Thresholds};

pub use bandage_types::{Command, Language, Metric, ParseError, Reading, SessionState};
