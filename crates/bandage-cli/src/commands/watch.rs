//! Watch command implementation.
//!
//! Keeps one session open and prints every telemetry frame as it arrives.
//! Stops on Ctrl-C, after `count` readings, or when the link drops.

use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::broadcast::error::RecvError;

use bandage_core::{SessionError, SessionEvent, SessionState};
use bandage_types::Language;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{
    FormatOptions, format_telemetry_json, format_telemetry_text, telemetry_frame,
};
use crate::util::{connect_session, describe_error, write_output};

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub device: Option<String>,
    pub timeout: Duration,
    pub count: u32,
    pub format: OutputFormat,
    pub language: Option<Language>,
    pub quiet: bool,
    pub config: &'a Config,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_watch(args: WatchArgs<'_>) -> Result<()> {
    let WatchArgs {
        device,
        timeout,
        count,
        format,
        language,
        quiet,
        config,
        opts,
    } = args;

    let session = connect_session(config, device, timeout, quiet).await?;
    if let Some(language) = language.or(config.language) {
        session.set_language(language).await?;
    }
    let mut events = session.subscribe_events();
    if !quiet {
        eprintln!("Connected. Waiting for readings (Ctrl-C to stop)...");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut readings: u32 = 0;
    let mut lost = false;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                if !quiet {
                    eprintln!();
                }
                break;
            }
            event = events.recv() => match event {
                Ok(event @ SessionEvent::Telemetry { .. }) => {
                    let frame = telemetry_frame(session.snapshot(), &event);
                    let content = match format {
                        OutputFormat::Json => format_telemetry_json(&frame, opts)?,
                        OutputFormat::Text => format_telemetry_text(&frame, opts),
                    };
                    write_output(&content)?;
                    readings += 1;
                    if count > 0 && readings >= count {
                        break;
                    }
                }
                Ok(SessionEvent::StateChanged { to: SessionState::Idle, .. }) => {
                    lost = true;
                    break;
                }
                Ok(SessionEvent::Error { error }) => {
                    if let Some(line) = warning_line(error, quiet) {
                        eprintln!("{}", line);
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Skipped {} session events", n);
                }
                Err(RecvError::Closed) => {
                    lost = true;
                    break;
                }
            },
        }
    }

    session.shutdown().await;
    if lost {
        bail!("Connection lost after {} reading(s)", readings);
    }
    if !quiet && count > 0 {
        eprintln!("Completed {} readings.", readings);
    }
    Ok(())
}

/// Warning printed for a surfaced session error, suppressed by `--quiet`.
fn warning_line(error: SessionError, quiet: bool) -> Option<String> {
    if quiet {
        tracing::debug!("Session error: {}", describe_error(error));
        return None;
    }
    Some(format!("Warning: {}", describe_error(error)))
}
