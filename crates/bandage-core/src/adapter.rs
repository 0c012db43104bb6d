//! Radio adapter abstraction.
//!
//! The session manager never talks to a Bluetooth stack directly. It drives
//! a [`RadioAdapter`], whose methods only *request* an operation. Outcomes
//! (discoveries, connection results, notifications, write acknowledgements)
//! come back as [`AdapterEvent`](crate::events::AdapterEvent)s on a channel
//! that the session loop drains serially.
//!
//! A method returns `Err` only when the request cannot even be issued, for
//! example when the radio is powered off.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Opaque identifier of a discovered peripheral.
///
/// A MAC address on Linux/Windows, a CoreBluetooth UUID on macOS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Create a device identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered GATT service on a peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceHandle {
    /// Peripheral the service belongs to.
    pub device: DeviceId,
    /// Service UUID.
    pub uuid: Uuid,
}

/// A discovered GATT characteristic on a peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharHandle {
    /// Peripheral the characteristic belongs to.
    pub device: DeviceId,
    /// Service the characteristic belongs to.
    pub service: Uuid,
    /// Characteristic UUID.
    pub uuid: Uuid,
}

/// Characteristics found during discovery, keyed by UUID.
pub type CharacteristicMap = HashMap<Uuid, CharHandle>;

/// Operations the session manager needs from a radio stack.
///
/// Implemented by [`crate::btle::BtleplugAdapter`] for real hardware and by
/// [`crate::mock::MockAdapter`] for tests.
#[async_trait]
pub trait RadioAdapter: Send + Sync {
    /// Start scanning without a service filter.
    ///
    /// Each advertisement is reported as `AdapterEvent::DeviceDiscovered`.
    async fn scan(&self) -> Result<()>;

    /// Stop an active scan.
    async fn stop_scan(&self) -> Result<()>;

    /// Connect to a discovered device.
    ///
    /// Reports `AdapterEvent::Connected` or `AdapterEvent::ConnectFailed`.
    async fn connect(&self, device: &DeviceId) -> Result<()>;

    /// Disconnect from a device.
    ///
    /// Reports `AdapterEvent::Disconnected` once the link is down.
    async fn disconnect(&self, device: &DeviceId) -> Result<()>;

    /// Look for a service on a connected device.
    ///
    /// Reports `AdapterEvent::ServiceDiscovered`, `AdapterEvent::ServiceNotFound`
    /// or `AdapterEvent::DiscoveryFailed`.
    async fn discover_services(&self, device: &DeviceId, service: Uuid) -> Result<()>;

    /// Look for characteristics within a service.
    ///
    /// Reports `AdapterEvent::CharacteristicsDiscovered` with whichever of
    /// `targets` were found, or `AdapterEvent::DiscoveryFailed`.
    async fn discover_characteristics(
        &self,
        service: &ServiceHandle,
        targets: &[Uuid],
    ) -> Result<()>;

    /// Enable notifications on a characteristic.
    ///
    /// Each notification is reported as `AdapterEvent::Notification`.
    async fn subscribe(&self, characteristic: &CharHandle) -> Result<()>;

    /// Write with response to a characteristic.
    ///
    /// Reports `AdapterEvent::WriteCompleted` when the device acknowledges
    /// (or the write fails).
    async fn write(&self, characteristic: &CharHandle, data: &[u8]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_display() {
        let id = DeviceId::new("AA:BB:CC:DD:EE:FF");
        assert_eq!(id.to_string(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(id.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_handles_are_hashable_keys() {
        let device = DeviceId::new("dev");
        let handle = CharHandle {
            device: device.clone(),
            service: Uuid::nil(),
            uuid: Uuid::from_u128(1),
        };
        let mut map = CharacteristicMap::new();
        map.insert(handle.uuid, handle.clone());
        assert_eq!(map.get(&Uuid::from_u128(1)), Some(&handle));
    }
}
