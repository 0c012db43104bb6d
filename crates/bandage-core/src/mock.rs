//! Mock radio adapter for testing.
//!
//! This module provides a [`MockAdapter`] that can be used for unit testing
//! the session manager without requiring actual BLE hardware.
//!
//! # Features
//!
//! - **Scripted peripherals**: advertise any number of named devices
//! - **Auto-respond**: answer each request with the event real hardware would report
//! - **Failure injection**: power the radio off, refuse connections, reject writes
//! - **Call recording**: inspect every request the session issued

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use bandage_types::uuid::{NOTIFY_CHARACTERISTIC, UART_SERVICE, WRITE_CHARACTERISTIC};

use crate::adapter::{CharHandle, CharacteristicMap, DeviceId, RadioAdapter, ServiceHandle};
use crate::error::{Error, Result};
use crate::events::{AdapterEvent, AdapterEventSender, DisconnectReason};

/// A request recorded by [`MockAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    Scan,
    StopScan,
    Connect(DeviceId),
    Disconnect(DeviceId),
    DiscoverServices { device: DeviceId, service: Uuid },
    DiscoverCharacteristics { service: ServiceHandle, targets: Vec<Uuid> },
    Subscribe(CharHandle),
    Write { characteristic: CharHandle, data: Vec<u8> },
}

/// A mock radio adapter.
///
/// Events are pushed with `try_send` so a session driving the mock from its
/// own loop never blocks on the channel it drains.
///
/// # Example
///
/// ```
/// use bandage_core::events::default_adapter_channel;
/// use bandage_core::{MockAdapter, RadioAdapter};
///
/// #[tokio::main]
/// async fn main() {
///     let (tx, mut rx) = default_adapter_channel();
///     let adapter = MockAdapter::builder().device("Smart Bandage").build(tx);
///     adapter.scan().await.unwrap();
///     assert!(rx.try_recv().is_ok());
/// }
/// ```
pub struct MockAdapter {
    events: AdapterEventSender,
    devices: RwLock<Vec<(DeviceId, String)>>,
    characteristics: RwLock<Vec<Uuid>>,
    calls: RwLock<Vec<AdapterCall>>,
    auto_respond: AtomicBool,
    available: AtomicBool,
    has_service: AtomicBool,
    fail_connect: AtomicBool,
    fail_writes: AtomicBool,
    write_count: AtomicU32,
}

impl std::fmt::Debug for MockAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAdapter")
            .field("auto_respond", &self.auto_respond.load(Ordering::Relaxed))
            .field("available", &self.available.load(Ordering::Relaxed))
            .field("write_count", &self.write_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MockAdapter {
    /// Create a builder.
    pub fn builder() -> MockAdapterBuilder {
        MockAdapterBuilder::new()
    }

    fn auto(&self) -> bool {
        self.auto_respond.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(Error::AdapterUnavailable)
        }
    }

    async fn record(&self, call: AdapterCall) {
        self.calls.write().await.push(call);
    }

    fn push(&self, event: AdapterEvent) {
        if let Err(e) = self.events.try_send(event) {
            warn!("Mock adapter dropped event: {}", e);
        }
    }

    /// Send an event as if the platform reported it.
    pub async fn emit(&self, event: AdapterEvent) {
        if self.events.send(event).await.is_err() {
            warn!("Mock adapter event receiver dropped");
        }
    }

    /// Report a telemetry notification on the subscribed characteristic.
    ///
    /// Does nothing if nothing has been subscribed yet.
    pub async fn notify(&self, frame: &[u8]) {
        let subscribed = self.calls.read().await.iter().rev().find_map(|c| match c {
            AdapterCall::Subscribe(handle) => Some(handle.clone()),
            _ => None,
        });
        match subscribed {
            Some(characteristic) => {
                self.emit(AdapterEvent::Notification {
                    characteristic,
                    value: frame.to_vec(),
                })
                .await
            }
            None => warn!("Mock notification without a subscription"),
        }
    }

    /// Identifier of the first advertised device with `name`.
    pub async fn device_id(&self, name: &str) -> Option<DeviceId> {
        self.devices
            .read()
            .await
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| id.clone())
    }

    /// All requests so far, oldest first.
    pub async fn calls(&self) -> Vec<AdapterCall> {
        self.calls.read().await.clone()
    }

    /// Forget recorded requests.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Payloads of all writes so far.
    pub async fn writes(&self) -> Vec<Vec<u8>> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                AdapterCall::Write { data, .. } => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of write requests received.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Power the simulated radio on or off.
    ///
    /// In auto-respond mode this also reports the change.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
        if self.auto() {
            self.push(AdapterEvent::AdapterStateChanged { available });
        }
    }

    /// Make subsequent write acknowledgements fail.
    pub fn set_should_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent connection attempts fail.
    pub fn set_should_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl RadioAdapter for MockAdapter {
    async fn scan(&self) -> Result<()> {
        self.check_available()?;
        self.record(AdapterCall::Scan).await;
        if self.auto() {
            for (device, name) in self.devices.read().await.iter() {
                self.push(AdapterEvent::DeviceDiscovered {
                    device: device.clone(),
                    name: Some(name.clone()),
                });
            }
        }
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        self.record(AdapterCall::StopScan).await;
        Ok(())
    }

    async fn connect(&self, device: &DeviceId) -> Result<()> {
        self.check_available()?;
        self.record(AdapterCall::Connect(device.clone())).await;
        if self.auto() {
            let device = device.clone();
            if self.fail_connect.load(Ordering::Relaxed) {
                self.push(AdapterEvent::ConnectFailed {
                    device,
                    reason: "Mock connect failure".to_string(),
                });
            } else {
                self.push(AdapterEvent::Connected { device });
            }
        }
        Ok(())
    }

    async fn disconnect(&self, device: &DeviceId) -> Result<()> {
        self.record(AdapterCall::Disconnect(device.clone())).await;
        if self.auto() {
            self.push(AdapterEvent::Disconnected {
                device: device.clone(),
                reason: DisconnectReason::UserRequested,
            });
        }
        Ok(())
    }

    async fn discover_services(&self, device: &DeviceId, service: Uuid) -> Result<()> {
        self.check_available()?;
        self.record(AdapterCall::DiscoverServices {
            device: device.clone(),
            service,
        })
        .await;
        if self.auto() {
            if self.has_service.load(Ordering::Relaxed) {
                self.push(AdapterEvent::ServiceDiscovered {
                    service: ServiceHandle {
                        device: device.clone(),
                        uuid: service,
                    },
                });
            } else {
                self.push(AdapterEvent::ServiceNotFound {
                    device: device.clone(),
                    uuid: service,
                });
            }
        }
        Ok(())
    }

    async fn discover_characteristics(
        &self,
        service: &ServiceHandle,
        targets: &[Uuid],
    ) -> Result<()> {
        self.check_available()?;
        self.record(AdapterCall::DiscoverCharacteristics {
            service: service.clone(),
            targets: targets.to_vec(),
        })
        .await;
        if self.auto() {
            let present = self.characteristics.read().await;
            let found: CharacteristicMap = targets
                .iter()
                .filter(|uuid| present.contains(uuid))
                .map(|uuid| {
                    let handle = CharHandle {
                        device: service.device.clone(),
                        service: service.uuid,
                        uuid: *uuid,
                    };
                    (*uuid, handle)
                })
                .collect();
            self.push(AdapterEvent::CharacteristicsDiscovered {
                service: service.clone(),
                found,
            });
        }
        Ok(())
    }

    async fn subscribe(&self, characteristic: &CharHandle) -> Result<()> {
        self.check_available()?;
        self.record(AdapterCall::Subscribe(characteristic.clone()))
            .await;
        Ok(())
    }

    async fn write(&self, characteristic: &CharHandle, data: &[u8]) -> Result<()> {
        self.check_available()?;
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.record(AdapterCall::Write {
            characteristic: characteristic.clone(),
            data: data.to_vec(),
        })
        .await;
        if self.auto() {
            let result = if self.fail_writes.load(Ordering::Relaxed) {
                Err("Mock write failure".to_string())
            } else {
                Ok(())
            };
            self.push(AdapterEvent::WriteCompleted {
                characteristic: characteristic.clone(),
                result,
            });
        }
        Ok(())
    }
}

/// Builder for [`MockAdapter`].
#[derive(Debug, Clone)]
pub struct MockAdapterBuilder {
    devices: Vec<(DeviceId, String)>,
    characteristics: Vec<Uuid>,
    auto_respond: bool,
    available: bool,
    has_service: bool,
    fail_connect: bool,
    fail_writes: bool,
}

impl Default for MockAdapterBuilder {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            characteristics: vec![NOTIFY_CHARACTERISTIC, WRITE_CHARACTERISTIC],
            auto_respond: true,
            available: true,
            has_service: true,
            fail_connect: false,
            fail_writes: false,
        }
    }
}

impl MockAdapterBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise a device with a random identifier.
    #[must_use]
    pub fn device(self, name: &str) -> Self {
        let id = format!("MOCK-{:06X}", rand::random::<u32>() % 0xFFFFFF);
        self.device_with_id(&id, name)
    }

    /// Advertise a device with a fixed identifier.
    #[must_use]
    pub fn device_with_id(mut self, id: &str, name: &str) -> Self {
        self.devices.push((DeviceId::new(id), name.to_string()));
        self
    }

    /// Characteristics present in the service.
    ///
    /// Defaults to both UART characteristics.
    #[must_use]
    pub fn characteristics(mut self, uuids: Vec<Uuid>) -> Self {
        self.characteristics = uuids;
        self
    }

    /// Whether requests are answered with events (default `true`).
    #[must_use]
    pub fn auto_respond(mut self, auto: bool) -> Self {
        self.auto_respond = auto;
        self
    }

    /// Whether the radio is powered (default `true`).
    #[must_use]
    pub fn available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Whether devices expose the requested service (default `true`).
    #[must_use]
    pub fn has_service(mut self, has_service: bool) -> Self {
        self.has_service = has_service;
        self
    }

    /// Whether connection attempts fail (default `false`).
    #[must_use]
    pub fn fail_connect(mut self, fail: bool) -> Self {
        self.fail_connect = fail;
        self
    }

    /// Whether write acknowledgements fail (default `false`).
    #[must_use]
    pub fn fail_writes(mut self, fail: bool) -> Self {
        self.fail_writes = fail;
        self
    }

    /// Build the adapter, reporting events on `events`.
    #[must_use]
    pub fn build(self, events: AdapterEventSender) -> MockAdapter {
        MockAdapter {
            events,
            devices: RwLock::new(self.devices),
            characteristics: RwLock::new(self.characteristics),
            calls: RwLock::new(Vec::new()),
            auto_respond: AtomicBool::new(self.auto_respond),
            available: AtomicBool::new(self.available),
            has_service: AtomicBool::new(self.has_service),
            fail_connect: AtomicBool::new(self.fail_connect),
            fail_writes: AtomicBool::new(self.fail_writes),
            write_count: AtomicU32::new(0),
        }
    }
}

/// Handle for the default service on a mock device.
pub fn mock_service(device: &DeviceId) -> ServiceHandle {
    ServiceHandle {
        device: device.clone(),
        uuid: UART_SERVICE,
    }
}
