//! Device session manager.
//!
//! [`SessionManager`] owns the connection state machine, the device handle
//! and the telemetry history. It is driven by three inputs:
//!
//! - consumer requests (`start_session`, `disconnect`, `send_command`)
//! - [`AdapterEvent`]s reported by the radio adapter
//! - an optional discovery deadline
//!
//! The manager can be driven directly (every method takes `&mut self`), or
//! moved onto its own task with [`SessionManager::spawn`], which drains all
//! inputs serially and hands back a cloneable [`SessionHandle`]. Either way
//! there is exactly one writer; consumers only ever see immutable
//! [`SessionSnapshot`]s published through a `watch` channel.
//!
//! ```text
//! Idle --start--> Scanning --found--> Connecting --connected--> DiscoveringServices
//!   ^                                                                 |
//!   |                                                          service found
//!   |                                                                 v
//!   +--disconnected-- Disconnecting <--disconnect-- Ready <--chars-- DiscoveringCharacteristics
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use bandage_types::{Command, Language, SessionState};

use crate::adapter::{CharHandle, DeviceId, RadioAdapter, ServiceHandle};
use crate::codec;
use crate::config::SessionConfig;
use crate::error::{Error, Result, SessionError};
use crate::events::{
    AdapterEvent, AdapterEventReceiver, EventDispatcher, SessionEvent, SessionEventReceiver,
};
use crate::history::{HistorySnapshot, TelemetryHistory};
use crate::thresholds::{StatusBand, Thresholds};

/// The peripheral currently associated with the session.
///
/// Created when the target device is found, dropped on disconnect or
/// failure. No handle survives a reset to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Adapter identifier of the peripheral.
    pub id: DeviceId,
    /// Advertised name.
    pub name: String,
    service: Option<ServiceHandle>,
    notify: Option<CharHandle>,
    write: Option<CharHandle>,
}

impl DeviceHandle {
    fn new(id: DeviceId, name: String) -> Self {
        Self {
            id,
            name,
            service: None,
            notify: None,
            write: None,
        }
    }

    /// The telemetry characteristic, once discovered.
    pub fn notify_characteristic(&self) -> Option<&CharHandle> {
        self.notify.as_ref()
    }

    /// The command characteristic, once discovered.
    pub fn write_characteristic(&self) -> Option<&CharHandle> {
        self.write.as_ref()
    }
}

/// Immutable view of the session published after every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current state machine state.
    pub state: SessionState,
    /// Whether a radio link is up.
    pub connected: bool,
    /// Whether the radio was available at last check.
    pub adapter_available: bool,
    /// Identifier of the associated device, if any.
    pub device_id: Option<DeviceId>,
    /// Name of the associated device, if any.
    pub device_name: Option<String>,
    /// Language flag for the presentation layer.
    pub language: Language,
    /// Latest temperature, `None` before the first frame.
    pub temperature: Option<f64>,
    /// Latest humidity, `None` before the first frame.
    pub humidity: Option<f64>,
    /// Band of the latest temperature.
    pub temperature_band: Option<StatusBand>,
    /// Band of the latest humidity.
    pub humidity_band: Option<StatusBand>,
    /// Bounded history of both metrics.
    pub history: HistorySnapshot,
    /// Most recent surfaced error, cleared by the next `start_session`.
    pub last_error: Option<SessionError>,
    /// Frames decoded since the manager was created.
    pub frames_decoded: u64,
    /// Frames discarded as malformed since the manager was created.
    pub frames_dropped: u64,
}

/// Requests sent from a [`SessionHandle`] to the session task.
#[derive(Debug)]
enum SessionCommand {
    StartSession,
    Disconnect,
    Send {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    ToggleLanguage,
    SetLanguage(Language),
}

/// Owner of the device session state.
pub struct SessionManager<A: RadioAdapter> {
    adapter: Arc<A>,
    config: SessionConfig,
    thresholds: Thresholds,
    state: SessionState,
    device: Option<DeviceHandle>,
    history: TelemetryHistory,
    latest: Option<(f64, f64)>,
    language: Language,
    adapter_available: bool,
    last_error: Option<SessionError>,
    frames_decoded: u64,
    frames_dropped: u64,
    consecutive_malformed: u32,
    discovery_deadline: Option<Instant>,
    state_tx: watch::Sender<SessionSnapshot>,
    events: EventDispatcher,
}

impl<A: RadioAdapter> std::fmt::Debug for SessionManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state)
            .field("device", &self.device)
            .field("language", &self.language)
            .field("frames_decoded", &self.frames_decoded)
            .finish_non_exhaustive()
    }
}

impl<A: RadioAdapter + 'static> SessionManager<A> {
    /// Create a session manager in the `Idle` state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails
    /// [`SessionConfig::validate`].
    pub fn new(adapter: Arc<A>, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let history = TelemetryHistory::new(config.history_capacity)?;
        let thresholds = Thresholds::new(config.thresholds.clone());
        let events = EventDispatcher::new(config.event_capacity);

        let initial = SessionSnapshot {
            state: SessionState::Idle,
            connected: false,
            adapter_available: true,
            device_id: None,
            device_name: None,
            language: Language::default(),
            temperature: None,
            humidity: None,
            temperature_band: None,
            humidity_band: None,
            history: history.snapshot(),
            last_error: None,
            frames_decoded: 0,
            frames_dropped: 0,
        };
        let (state_tx, _) = watch::channel(initial);

        Ok(Self {
            adapter,
            config,
            thresholds,
            state: SessionState::Idle,
            device: None,
            history,
            latest: None,
            language: Language::default(),
            adapter_available: true,
            last_error: None,
            frames_decoded: 0,
            frames_dropped: 0,
            consecutive_malformed: 0,
            discovery_deadline: None,
            state_tx,
            events,
        })
    }

    // --- Accessors ---

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The associated device, if any.
    pub fn device(&self) -> Option<&DeviceHandle> {
        self.device.as_ref()
    }

    /// The adapter driven by this manager.
    pub fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Copy of the last published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to published snapshots.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_tx.subscribe()
    }

    /// Subscribe to session events.
    pub fn subscribe_events(&self) -> SessionEventReceiver {
        self.events.subscribe()
    }

    // --- Consumer operations ---

    /// Start scanning, or disconnect if a session is already underway.
    ///
    /// From `Idle` this begins a scan. From `Ready` or any connection state
    /// it acts as the "disconnect" half of a connect/disconnect toggle.
    /// While scanning or disconnecting it does nothing.
    #[tracing::instrument(level = "debug", skip(self), fields(state = %self.state))]
    pub async fn start_session(&mut self) {
        match self.state {
            SessionState::Idle => {
                self.last_error = None;
                match self.adapter.scan().await {
                    Ok(()) => {
                        self.adapter_available = true;
                        info!("Scanning for '{}'...", self.config.device_name);
                        self.transition(SessionState::Scanning);
                    }
                    Err(e) => {
                        warn!("Could not start scan: {}", e);
                        self.adapter_available = false;
                        self.surface(SessionError::AdapterUnavailable);
                    }
                }
            }
            SessionState::Connecting
            | SessionState::DiscoveringServices
            | SessionState::DiscoveringCharacteristics
            | SessionState::Ready => {
                info!("Session active, start request disconnects");
                self.disconnect().await;
            }
            SessionState::Scanning | SessionState::Disconnecting => {
                debug!("Start request ignored while {}", self.state);
            }
        }
        self.publish();
    }

    /// Disconnect from the device, or stop scanning.
    ///
    /// Safe to call from any state. With no device associated this is a
    /// no-op (apart from stopping an active scan). Otherwise the adapter is
    /// asked to disconnect and the session waits in `Disconnecting` for the
    /// confirming event.
    pub async fn disconnect(&mut self) {
        match self.state {
            SessionState::Idle | SessionState::Disconnecting => {
                debug!("Disconnect ignored while {}", self.state);
            }
            SessionState::Scanning => {
                if let Err(e) = self.adapter.stop_scan().await {
                    warn!("Failed to stop scan: {}", e);
                }
                self.reset();
            }
            _ => match self.device.as_ref().map(|d| d.id.clone()) {
                None => self.reset(),
                Some(id) => {
                    info!("Disconnecting from {}...", id);
                    match self.adapter.disconnect(&id).await {
                        Ok(()) => {
                            self.discovery_deadline = None;
                            self.transition(SessionState::Disconnecting);
                        }
                        Err(e) => {
                            warn!("Adapter refused disconnect ({}), resetting", e);
                            self.reset();
                        }
                    }
                }
            },
        }
        self.publish();
    }

    /// Send an actuator command.
    ///
    /// The write is handed to the adapter and not awaited; a failed
    /// acknowledgement surfaces later as [`SessionError::WriteFailed`].
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceNotReady`] if the session is not `Ready`; nothing is written
    /// - [`Error::WriteFailed`] (or the adapter's error) if the write could not be issued
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn send_command(&mut self, command: Command) -> Result<()> {
        let write = match (&self.state, &self.device) {
            (SessionState::Ready, Some(device)) => device.write.clone(),
            _ => None,
        };
        let Some(write) = write else {
            warn!("Dropping command {}: device not ready ({})", command, self.state);
            return Err(Error::DeviceNotReady { state: self.state });
        };

        let adapter = Arc::clone(&self.adapter);
        if let Err(e) = adapter.write(&write, &codec::encode_command(command)).await {
            warn!("Failed to write command {}: {}", command, e);
            self.surface(SessionError::WriteFailed);
            self.publish();
            return Err(e);
        }

        info!("Sent command: {}", command);
        self.events.send(SessionEvent::CommandSent { command });
        Ok(())
    }

    /// Switch the language flag carried for the presentation layer.
    pub fn toggle_language(&mut self) {
        self.set_language(self.language.toggle());
    }

    /// Set the language flag carried for the presentation layer.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        self.publish();
    }

    // --- Adapter events ---

    /// Apply one adapter event to the state machine.
    ///
    /// Events that do not fit the current state are ignored.
    pub async fn handle_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::AdapterStateChanged { available } => {
                self.adapter_available = available;
                if !available {
                    warn!("Bluetooth adapter became unavailable");
                    if self.state.is_busy() {
                        self.reset();
                    }
                    self.surface(SessionError::AdapterUnavailable);
                }
            }
            AdapterEvent::DeviceDiscovered { device, name } => {
                self.on_device_discovered(device, name).await;
            }
            AdapterEvent::Connected { device } => {
                if self.state != SessionState::Connecting || !self.is_current(&device) {
                    debug!("Ignoring connect event for {} while {}", device, self.state);
                } else {
                    info!("Connected to {}, discovering services", device);
                    self.transition(SessionState::DiscoveringServices);
                    self.discovery_deadline =
                        self.config.discovery_timeout.map(|t| Instant::now() + t);
                    let service = self.config.service_uuid;
                    let adapter = Arc::clone(&self.adapter);
                    if let Err(e) = adapter.discover_services(&device, service).await {
                        self.fail(e).await;
                    }
                }
            }
            AdapterEvent::ConnectFailed { device, reason } => {
                if self.is_current(&device) && self.state.is_busy() {
                    warn!("Connection to {} failed: {}", device, reason);
                    self.reset();
                    self.surface(SessionError::ConnectFailed);
                }
            }
            AdapterEvent::Disconnected { device, reason } => {
                // A link that is still being established reports through
                // Connected/ConnectFailed; a disconnect seen here is a late
                // duplicate from an earlier session with the same device.
                if self.state == SessionState::Connecting {
                    debug!("Ignoring stale disconnect of {} while connecting", device);
                } else if self.is_current(&device) && self.state.is_busy() {
                    info!("Disconnected from {} ({:?})", device, reason);
                    self.reset();
                } else {
                    debug!("Ignoring disconnect of {}", device);
                }
            }
            AdapterEvent::ServiceDiscovered { service } => {
                self.on_service_discovered(service).await;
            }
            AdapterEvent::ServiceNotFound { device, uuid } => {
                if self.state == SessionState::DiscoveringServices && self.is_current(&device) {
                    warn!("Service {} not found on {}, session parked", uuid, device);
                    self.surface(SessionError::DiscoveryIncomplete);
                }
            }
            AdapterEvent::CharacteristicsDiscovered { service, found } => {
                if self.state != SessionState::DiscoveringCharacteristics
                    || !self.is_current(&service.device)
                {
                    debug!("Ignoring characteristics for {}", service.device);
                } else {
                    let notify = found.get(&self.config.notify_uuid).cloned();
                    let write = found.get(&self.config.write_uuid).cloned();
                    self.on_characteristics(notify, write).await;
                }
            }
            AdapterEvent::DiscoveryFailed { device, reason } => {
                if self.is_current(&device) && self.state.is_connecting() {
                    self.fail(Error::DiscoveryIncomplete { missing: reason })
                        .await;
                }
            }
            AdapterEvent::Notification {
                characteristic,
                value,
            } => {
                let subscribed = self.device.as_ref().and_then(|d| d.notify_characteristic());
                if self.state == SessionState::Ready && subscribed == Some(&characteristic) {
                    self.on_notification(&value);
                } else {
                    trace!("Ignoring notification from {}", characteristic.uuid);
                }
            }
            AdapterEvent::WriteCompleted {
                characteristic,
                result,
            } => {
                if self.state != SessionState::Ready {
                    debug!("Ignoring write ack for {} after reset", characteristic.uuid);
                } else {
                    match result {
                        Ok(()) => {
                            debug!("Device acknowledged write to {}", characteristic.uuid);
                            self.events.send(SessionEvent::CommandAcknowledged);
                        }
                        Err(reason) => {
                            warn!("Write to {} failed: {}", characteristic.uuid, reason);
                            self.events.send(SessionEvent::WriteFailed { reason });
                            self.surface(SessionError::WriteFailed);
                        }
                    }
                }
            }
        }
        self.publish();
    }

    async fn on_device_discovered(&mut self, device: DeviceId, name: Option<String>) {
        if self.state != SessionState::Scanning {
            return;
        }
        let Some(name) = name.filter(|n| *n == self.config.device_name) else {
            trace!("Ignoring device {}", device);
            return;
        };

        info!("Found '{}' ({}), connecting", name, device);
        let adapter = Arc::clone(&self.adapter);
        if let Err(e) = adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }
        self.device = Some(DeviceHandle::new(device.clone(), name));
        self.transition(SessionState::Connecting);

        if let Err(e) = adapter.connect(&device).await {
            warn!("Connect request to {} refused: {}", device, e);
            self.reset();
            self.surface(
                e.session_error()
                    .unwrap_or(SessionError::ConnectFailed),
            );
        }
    }

    async fn on_service_discovered(&mut self, service: ServiceHandle) {
        if self.state != SessionState::DiscoveringServices
            || !self.is_current(&service.device)
            || service.uuid != self.config.service_uuid
        {
            debug!("Ignoring service {}", service.uuid);
            return;
        }

        debug!("Service {} found, discovering characteristics", service.uuid);
        if let Some(device) = self.device.as_mut() {
            device.service = Some(service.clone());
        }
        self.transition(SessionState::DiscoveringCharacteristics);

        let targets = [self.config.notify_uuid, self.config.write_uuid];
        let adapter = Arc::clone(&self.adapter);
        if let Err(e) = adapter.discover_characteristics(&service, &targets).await {
            self.fail(e).await;
        }
    }

    async fn on_characteristics(&mut self, notify: Option<CharHandle>, write: Option<CharHandle>) {
        let (notify, write) = match (notify, write) {
            (Some(n), Some(w)) => (n, w),
            (n, w) => {
                let mut missing = Vec::new();
                if n.is_none() {
                    missing.push(self.config.notify_uuid.to_string());
                }
                if w.is_none() {
                    missing.push(self.config.write_uuid.to_string());
                }
                warn!("Characteristics missing: {}, session parked", missing.join(", "));
                self.surface(SessionError::DiscoveryIncomplete);
                return;
            }
        };

        let adapter = Arc::clone(&self.adapter);
        if let Err(e) = adapter.subscribe(&notify).await {
            self.fail(e).await;
            return;
        }

        if let Some(device) = self.device.as_mut() {
            device.notify = Some(notify);
            device.write = Some(write);
        }
        self.discovery_deadline = None;
        self.consecutive_malformed = 0;
        self.last_error = None;
        info!("Session ready");
        self.transition(SessionState::Ready);
    }

    /// Decode one telemetry notification.
    ///
    /// On success both readings are pushed into the history and the derived
    /// state is republished. Malformed frames are discarded without touching
    /// state, history or bands; only the drop counter moves.
    pub fn on_notification(&mut self, raw: &[u8]) {
        match codec::decode(raw) {
            Ok((temperature, humidity)) => {
                self.history.push(temperature);
                self.history.push(humidity);
                self.latest = Some((temperature.value(), humidity.value()));
                self.frames_decoded += 1;
                self.consecutive_malformed = 0;
                // Publish first so listeners woken by the event read fresh state
                self.publish();
                self.events.send(SessionEvent::Telemetry {
                    temperature: temperature.value(),
                    humidity: humidity.value(),
                    temperature_band: self.thresholds.evaluate(&temperature),
                    humidity_band: self.thresholds.evaluate(&humidity),
                });
            }
            Err(e) => {
                trace!("Discarding malformed frame: {}", e);
                self.frames_dropped += 1;
                self.consecutive_malformed += 1;
                if self.config.max_consecutive_malformed == Some(self.consecutive_malformed) {
                    warn!("{} malformed frames in a row", self.consecutive_malformed);
                    self.surface(SessionError::TooManyMalformedFrames);
                }
                self.publish();
            }
        }
    }

    /// Give up on a discovery that did not finish in time.
    pub async fn discovery_timed_out(&mut self) {
        self.discovery_deadline = None;
        if !matches!(
            self.state,
            SessionState::DiscoveringServices | SessionState::DiscoveringCharacteristics
        ) {
            return;
        }
        let duration = self.config.discovery_timeout.unwrap_or_default();
        warn!("Discovery did not finish within {:?}", duration);
        self.fail(Error::DiscoveryIncomplete {
            missing: format!("discovery timed out after {:?}", duration),
        })
        .await;
        self.publish();
    }

    // --- Internals ---

    fn is_current(&self, device: &DeviceId) -> bool {
        self.device.as_ref().is_some_and(|d| d.id == *device)
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        debug!("Session state {} -> {}", from, to);
        self.state = to;
        self.events.send(SessionEvent::StateChanged { from, to });
    }

    /// Drop the device association and return to `Idle`.
    fn reset(&mut self) {
        self.device = None;
        self.discovery_deadline = None;
        self.transition(SessionState::Idle);
    }

    /// Tear down after an adapter error: best-effort disconnect, then reset.
    async fn fail(&mut self, error: Error) {
        warn!("Session failed: {}", error);
        if let Some(id) = self.device.as_ref().map(|d| d.id.clone())
            && let Err(e) = self.adapter.disconnect(&id).await
        {
            debug!("Disconnect after failure also failed: {}", e);
        }
        self.reset();
        if let Some(session_error) = error.session_error() {
            self.surface(session_error);
        }
    }

    fn surface(&mut self, error: SessionError) {
        self.last_error = Some(error);
        self.events.send(SessionEvent::Error { error });
    }

    fn publish(&self) {
        let temperature = self.latest.map(|(t, _)| t);
        let humidity = self.latest.map(|(_, h)| h);
        let snapshot = SessionSnapshot {
            state: self.state,
            connected: self.state.is_connected(),
            adapter_available: self.adapter_available,
            device_id: self.device.as_ref().map(|d| d.id.clone()),
            device_name: self.device.as_ref().map(|d| d.name.clone()),
            language: self.language,
            temperature,
            humidity,
            temperature_band: temperature.map(|t| self.thresholds.evaluate_temperature(t)),
            humidity_band: humidity.map(|h| self.thresholds.evaluate_humidity(h)),
            history: self.history.snapshot(),
            last_error: self.last_error,
            frames_decoded: self.frames_decoded,
            frames_dropped: self.frames_dropped,
        };
        self.state_tx.send_replace(snapshot);
    }

    // --- Session task ---

    /// Move the manager onto its own task.
    ///
    /// The task drains consumer requests, adapter events and the discovery
    /// deadline one at a time until [`SessionHandle::shutdown`] is called,
    /// every handle is dropped, or the adapter channel closes.
    pub fn spawn(self, adapter_events: AdapterEventReceiver) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(self.config.command_capacity);
        let cancel = CancellationToken::new();
        let state = self.state_tx.subscribe();
        let events = self.events.clone();

        let task_token = cancel.clone();
        let task = tokio::spawn(self.run(command_rx, adapter_events, task_token));

        SessionHandle {
            commands: command_tx,
            state,
            events,
            cancel,
            task: Arc::new(Mutex::new(Some(task))),
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut adapter_events: AdapterEventReceiver,
        cancel: CancellationToken,
    ) {
        info!("Session task started");
        loop {
            let deadline = self.discovery_deadline;
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Session cancelled, stopping gracefully");
                    break;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("All session handles dropped");
                        break;
                    }
                },
                event = adapter_events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        warn!("Adapter event channel closed");
                        break;
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.discovery_timed_out().await;
                }
            }
        }
        self.shutdown().await;
        info!("Session task stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::StartSession => self.start_session().await,
            SessionCommand::Disconnect => self.disconnect().await,
            SessionCommand::Send { command, reply } => {
                let result = self.send_command(command).await;
                // The caller may have given up waiting
                let _ = reply.send(result);
            }
            SessionCommand::ToggleLanguage => self.toggle_language(),
            SessionCommand::SetLanguage(language) => self.set_language(language),
        }
    }

    async fn shutdown(&mut self) {
        match self.state {
            SessionState::Idle => {}
            SessionState::Scanning => {
                let _ = self.adapter.stop_scan().await;
            }
            _ => {
                if let Some(device) = self.device.as_ref() {
                    let _ = self.adapter.disconnect(&device.id).await;
                }
            }
        }
        self.reset();
        self.publish();
    }
}

/// Cloneable handle to a spawned session task.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionSnapshot>,
    events: EventDispatcher,
    cancel: CancellationToken,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.state.borrow().state)
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    async fn request(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// Start scanning, or disconnect if a session is active.
    pub async fn start_session(&self) -> Result<()> {
        self.request(SessionCommand::StartSession).await
    }

    /// Disconnect from the device or stop scanning.
    pub async fn disconnect(&self) -> Result<()> {
        self.request(SessionCommand::Disconnect).await
    }

    /// Send an actuator command and wait for it to be handed to the adapter.
    pub async fn send_command(&self, command: Command) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.request(SessionCommand::Send { command, reply }).await?;
        response.await.map_err(|_| Error::SessionClosed)?
    }

    /// Switch the language flag.
    pub async fn toggle_language(&self) -> Result<()> {
        self.request(SessionCommand::ToggleLanguage).await
    }

    /// Set the language flag.
    pub async fn set_language(&self, language: Language) -> Result<()> {
        self.request(SessionCommand::SetLanguage(language)).await
    }

    /// Copy of the latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to published snapshots.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Subscribe to session events.
    pub fn subscribe_events(&self) -> SessionEventReceiver {
        self.events.subscribe()
    }

    /// Wait until the session reaches `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the state is not reached within
    /// `within`, or [`Error::SessionClosed`] if the task stops first.
    pub async fn wait_for_state(
        &self,
        target: SessionState,
        within: Duration,
    ) -> Result<SessionSnapshot> {
        let mut rx = self.state.clone();
        match timeout(within, rx.wait_for(|s| s.state == target)).await {
            Ok(Ok(snapshot)) => Ok(snapshot.clone()),
            Ok(Err(_)) => Err(Error::SessionClosed),
            Err(_) => Err(Error::timeout(format!("wait for {}", target), within)),
        }
    }

    /// Whether the session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Stop the session task, disconnecting from the device first.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take()
            && let Err(e) = task.await
        {
            warn!("Session task ended abnormally: {}", e);
        }
    }
}
