//! Shared helpers for commands.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::time::timeout;

use bandage_core::events::default_adapter_channel;
use bandage_core::{BtleplugAdapter, SessionError, SessionHandle, SessionManager, SessionState};

use crate::config::Config;

/// Start a session and wait until the device is ready.
///
/// The session is shut down again if it fails or does not become ready
/// within `ready_timeout`.
pub async fn connect_session(
    config: &Config,
    device: Option<String>,
    ready_timeout: Duration,
    quiet: bool,
) -> Result<SessionHandle> {
    let session_config = config.to_session_config(device)?;
    let device_name = session_config.device_name.clone();

    let (tx, rx) = default_adapter_channel();
    let adapter = BtleplugAdapter::new(tx)
        .await
        .context("Failed to open Bluetooth adapter")?
        .operation_timeout(ready_timeout);
    let session = SessionManager::new(Arc::new(adapter), session_config)?.spawn(rx);

    if !quiet {
        eprintln!("Connecting to '{}'...", device_name);
    }
    session.start_session().await?;

    let mut state = session.subscribe_state();
    let outcome = timeout(
        ready_timeout,
        state.wait_for(|s| s.state == SessionState::Ready || s.last_error.is_some()),
    )
    .await
    .map(|r| r.map(|s| s.clone()));

    match outcome {
        Ok(Ok(snapshot)) if snapshot.state == SessionState::Ready => Ok(session),
        Ok(Ok(snapshot)) => {
            session.shutdown().await;
            match snapshot.last_error {
                Some(error) => bail!("Session failed: {}", describe_error(error)),
                None => bail!("Session failed in state {}", snapshot.state),
            }
        }
        Ok(Err(_)) => bail!("Session stopped unexpectedly"),
        Err(_) => {
            let state = session.snapshot().state;
            session.shutdown().await;
            bail!(
                "'{}' not ready after {}s (stuck in {})",
                device_name,
                ready_timeout.as_secs(),
                state
            )
        }
    }
}

/// Human-readable description of a surfaced session error.
pub fn describe_error(error: SessionError) -> &'static str {
    match error {
        SessionError::AdapterUnavailable => "Bluetooth adapter unavailable",
        SessionError::ConnectFailed => "connection failed",
        SessionError::DiscoveryIncomplete => "device is missing the expected service",
        SessionError::WriteFailed => "device did not acknowledge a command",
        SessionError::TooManyMalformedFrames => "device is sending malformed data",
        _ => "unknown error",
    }
}

/// Write content to stdout.
pub fn write_output(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
