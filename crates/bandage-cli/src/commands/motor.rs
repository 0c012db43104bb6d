//! Motor command implementation.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::time::timeout;

use bandage_core::SessionEvent;
use bandage_types::Command;

use crate::config::Config;
use crate::util::connect_session;

/// How long to wait for the device to acknowledge a write.
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn cmd_motor(
    command: Command,
    device: Option<String>,
    ready_timeout: Duration,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    let session = connect_session(config, device, ready_timeout, quiet).await?;
    let mut events = session.subscribe_events();

    if let Err(e) = session.send_command(command).await {
        session.shutdown().await;
        return Err(e).context("Failed to send command");
    }

    let ack = timeout(ACK_TIMEOUT, async {
        loop {
            match events.recv().await {
                Ok(SessionEvent::CommandAcknowledged) => return Ok(()),
                Ok(SessionEvent::WriteFailed { reason }) => return Err(anyhow!(reason)),
                Ok(_) => {}
                Err(e) => return Err(anyhow!(e)),
            }
        }
    })
    .await;

    session.shutdown().await;
    match ack {
        Ok(Ok(())) => {
            if !quiet {
                eprintln!("Sent {} ({})", command, command.token());
            }
            Ok(())
        }
        Ok(Err(e)) => Err(e).context("Device rejected command"),
        Err(_) => Err(anyhow!(
            "No acknowledgement within {}s",
            ACK_TIMEOUT.as_secs()
        )),
    }
}
