//! Bluetooth identifiers for the Smart Bandage peripheral.
//!
//! The device exposes a Nordic-UART-style service: one characteristic
//! notifies telemetry frames, the other accepts actuator commands.

use uuid::{Uuid, uuid};

/// Advertised local name of the target peripheral.
pub const DEVICE_NAME: &str = "Smart Bandage";

/// UART-like service carrying telemetry and commands.
pub const UART_SERVICE: Uuid = uuid!("6e400001-b5a3-f393-e0a9-e50e24dcca9e");

/// RX characteristic (core -> device), written with response.
pub const UART_RX: Uuid = uuid!("6e400002-b5a3-f393-e0a9-e50e24dcca9e");

/// TX characteristic (device -> core), delivers telemetry notifications.
pub const UART_TX: Uuid = uuid!("6e400003-b5a3-f393-e0a9-e50e24dcca9e");

/// Characteristic the core subscribes to for telemetry.
pub const NOTIFY_CHARACTERISTIC: Uuid = UART_TX;

/// Characteristic the core writes commands to.
pub const WRITE_CHARACTERISTIC: Uuid = UART_RX;
