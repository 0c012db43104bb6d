//! [`RadioAdapter`] backed by the platform Bluetooth stack via btleplug.
//!
//! Every request spawns a task that performs the btleplug call under a
//! timeout and reports the outcome as an [`AdapterEvent`]. A background pump
//! forwards central events (advertisements, remote disconnects) the same way.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::adapter::{CharHandle, CharacteristicMap, DeviceId, RadioAdapter, ServiceHandle};
use crate::error::{Error, Result};
use crate::events::{AdapterEvent, AdapterEventSender, DisconnectReason};

/// Default timeout for connect, discovery and write operations.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

type PeripheralCache = Arc<RwLock<HashMap<DeviceId, Peripheral>>>;

/// Radio adapter for real hardware.
pub struct BtleplugAdapter {
    adapter: Adapter,
    events: AdapterEventSender,
    peripherals: PeripheralCache,
    notification_tasks: Mutex<HashMap<DeviceId, Vec<JoinHandle<()>>>>,
    pump: JoinHandle<()>,
    operation_timeout: Duration,
}

impl std::fmt::Debug for BtleplugAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtleplugAdapter")
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl BtleplugAdapter {
    /// Open the first Bluetooth adapter and start forwarding its events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AdapterUnavailable`] if the system has no adapter, or
    /// [`Error::Bluetooth`] if the platform stack cannot be reached.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn new(events: AdapterEventSender) -> Result<Self> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::AdapterUnavailable)?;

        match adapter.adapter_info().await {
            Ok(info) => info!("Using Bluetooth adapter: {}", info),
            Err(e) => debug!("Could not read adapter info: {}", e),
        }

        let peripherals: PeripheralCache = Arc::new(RwLock::new(HashMap::new()));
        let central_events = adapter.events().await?;
        let pump = tokio::spawn(pump_central_events(
            adapter.clone(),
            central_events,
            Arc::clone(&peripherals),
            events.clone(),
        ));

        Ok(Self {
            adapter,
            events,
            peripherals,
            notification_tasks: Mutex::new(HashMap::new()),
            pump,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        })
    }

    /// Set the timeout applied to connect, discovery and write operations.
    #[must_use]
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    async fn peripheral(&self, device: &DeviceId) -> Option<Peripheral> {
        self.peripherals.read().await.get(device).cloned()
    }

    async fn find_characteristic(&self, handle: &CharHandle) -> Option<(Peripheral, Characteristic)> {
        let peripheral = self.peripheral(&handle.device).await?;
        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == handle.uuid && c.service_uuid == handle.service)?;
        Some((peripheral, characteristic))
    }

    fn abort_notifications(&self, device: &DeviceId) {
        if let Ok(mut tasks) = self.notification_tasks.lock()
            && let Some(handles) = tasks.remove(device)
        {
            debug!("Aborting {} notification task(s)", handles.len());
            for handle in handles {
                handle.abort();
            }
        }
    }
}

impl Drop for BtleplugAdapter {
    fn drop(&mut self) {
        self.pump.abort();
        if let Ok(mut tasks) = self.notification_tasks.lock() {
            for handle in tasks.drain().flat_map(|(_, handles)| handles) {
                handle.abort();
            }
        }
    }
}

/// Forward central events until the stream ends.
async fn pump_central_events(
    adapter: Adapter,
    mut stream: std::pin::Pin<Box<dyn futures::Stream<Item = CentralEvent> + Send>>,
    peripherals: PeripheralCache,
    events: AdapterEventSender,
) {
    while let Some(event) = stream.next().await {
        let forwarded = match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                let Ok(peripheral) = adapter.peripheral(&id).await else {
                    continue;
                };
                let name = match peripheral.properties().await {
                    Ok(props) => props.and_then(|p| p.local_name),
                    Err(e) => {
                        trace!("No properties for {:?}: {}", id, e);
                        None
                    }
                };
                let device = DeviceId::new(format_peripheral_id(&id));
                peripherals.write().await.insert(device.clone(), peripheral);
                AdapterEvent::DeviceDiscovered { device, name }
            }
            CentralEvent::DeviceDisconnected(id) => AdapterEvent::Disconnected {
                device: DeviceId::new(format_peripheral_id(&id)),
                reason: DisconnectReason::Remote,
            },
            _ => continue,
        };
        if events.send(forwarded).await.is_err() {
            debug!("Adapter event receiver dropped, stopping central pump");
            break;
        }
    }
}

/// Send an event from a detached task.
fn post(events: &AdapterEventSender, event: AdapterEvent) {
    let events = events.clone();
    tokio::spawn(async move {
        let _ = events.send(event).await;
    });
}

/// Format a peripheral ID as a string.
///
/// On macOS, peripheral IDs are UUIDs. On other platforms they are MAC
/// addresses.
fn format_peripheral_id(id: &PeripheralId) -> String {
    format!("{:?}", id)
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

#[async_trait]
impl RadioAdapter for BtleplugAdapter {
    async fn scan(&self) -> Result<()> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        self.adapter.stop_scan().await?;
        Ok(())
    }

    #[tracing::instrument(level = "info", skip(self), fields(device = %device))]
    async fn connect(&self, device: &DeviceId) -> Result<()> {
        let peripheral = self
            .peripheral(device)
            .await
            .ok_or_else(|| Error::connect_failed(Some(device.to_string()), "device not seen"))?;

        let events = self.events.clone();
        let device = device.clone();
        let limit = self.operation_timeout;
        tokio::spawn(async move {
            info!("Connecting to device...");
            let event = match timeout(limit, peripheral.connect()).await {
                Ok(Ok(())) => AdapterEvent::Connected { device },
                Ok(Err(e)) => AdapterEvent::ConnectFailed {
                    device,
                    reason: e.to_string(),
                },
                Err(_) => AdapterEvent::ConnectFailed {
                    device,
                    reason: format!("timed out after {:?}", limit),
                },
            };
            let _ = events.send(event).await;
        });
        Ok(())
    }

    async fn disconnect(&self, device: &DeviceId) -> Result<()> {
        self.abort_notifications(device);
        let Some(peripheral) = self.peripheral(device).await else {
            post(
                &self.events,
                AdapterEvent::Disconnected {
                    device: device.clone(),
                    reason: DisconnectReason::UserRequested,
                },
            );
            return Ok(());
        };

        let events = self.events.clone();
        let device = device.clone();
        tokio::spawn(async move {
            let reason = match peripheral.disconnect().await {
                Ok(()) => DisconnectReason::UserRequested,
                Err(e) => {
                    warn!("Disconnect from {} failed: {}", device, e);
                    DisconnectReason::BleError(e.to_string())
                }
            };
            let _ = events
                .send(AdapterEvent::Disconnected { device, reason })
                .await;
        });
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(device = %device))]
    async fn discover_services(&self, device: &DeviceId, service: Uuid) -> Result<()> {
        let peripheral = self
            .peripheral(device)
            .await
            .ok_or_else(|| Error::connect_failed(Some(device.to_string()), "device not seen"))?;

        let events = self.events.clone();
        let device = device.clone();
        let limit = self.operation_timeout;
        tokio::spawn(async move {
            let event = match timeout(limit, peripheral.discover_services()).await {
                Ok(Ok(())) => {
                    let services = peripheral.services();
                    debug!("Found {} services", services.len());
                    if services.iter().any(|s| s.uuid == service) {
                        AdapterEvent::ServiceDiscovered {
                            service: ServiceHandle {
                                device,
                                uuid: service,
                            },
                        }
                    } else {
                        AdapterEvent::ServiceNotFound {
                            device,
                            uuid: service,
                        }
                    }
                }
                Ok(Err(e)) => AdapterEvent::DiscoveryFailed {
                    device,
                    reason: e.to_string(),
                },
                Err(_) => AdapterEvent::DiscoveryFailed {
                    device,
                    reason: format!("service discovery timed out after {:?}", limit),
                },
            };
            let _ = events.send(event).await;
        });
        Ok(())
    }

    async fn discover_characteristics(
        &self,
        service: &ServiceHandle,
        targets: &[Uuid],
    ) -> Result<()> {
        let peripheral = self.peripheral(&service.device).await.ok_or_else(|| {
            Error::connect_failed(Some(service.device.to_string()), "device not seen")
        })?;

        // btleplug resolves characteristics together with their services
        let found: CharacteristicMap = peripheral
            .services()
            .into_iter()
            .filter(|s| s.uuid == service.uuid)
            .flat_map(|s| s.characteristics)
            .filter(|c| targets.contains(&c.uuid))
            .map(|c| {
                debug!("Characteristic: {}", c.uuid);
                let handle = CharHandle {
                    device: service.device.clone(),
                    service: service.uuid,
                    uuid: c.uuid,
                };
                (c.uuid, handle)
            })
            .collect();

        post(
            &self.events,
            AdapterEvent::CharacteristicsDiscovered {
                service: service.clone(),
                found,
            },
        );
        Ok(())
    }

    async fn subscribe(&self, characteristic: &CharHandle) -> Result<()> {
        let (peripheral, target) =
            self.find_characteristic(characteristic)
                .await
                .ok_or_else(|| Error::DiscoveryIncomplete {
                    missing: characteristic.uuid.to_string(),
                })?;

        peripheral.subscribe(&target).await?;
        let mut stream = peripheral.notifications().await?;

        let events = self.events.clone();
        let handle = characteristic.clone();
        let task = tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid != handle.uuid {
                    continue;
                }
                let event = AdapterEvent::Notification {
                    characteristic: handle.clone(),
                    value: notification.value,
                };
                if events.send(event).await.is_err() {
                    break;
                }
            }
            debug!("Notification stream for {} ended", handle.uuid);
        });

        if let Ok(mut tasks) = self.notification_tasks.lock() {
            tasks
                .entry(characteristic.device.clone())
                .or_default()
                .push(task);
        }
        Ok(())
    }

    async fn write(&self, characteristic: &CharHandle, data: &[u8]) -> Result<()> {
        let (peripheral, target) = self
            .find_characteristic(characteristic)
            .await
            .ok_or_else(|| {
                Error::write_failed(characteristic.uuid.to_string(), "characteristic not discovered")
            })?;

        let events = self.events.clone();
        let handle = characteristic.clone();
        let data = data.to_vec();
        let limit = self.operation_timeout;
        tokio::spawn(async move {
            let result = match timeout(
                limit,
                peripheral.write(&target, &data, WriteType::WithResponse),
            )
            .await
            {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!("timed out after {:?}", limit)),
            };
            let _ = events
                .send(AdapterEvent::WriteCompleted {
                    characteristic: handle,
                    result,
                })
                .await;
        });
        Ok(())
    }
}
