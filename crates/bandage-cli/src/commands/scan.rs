//! Scan command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{Instant, sleep_until};

use bandage_core::events::default_adapter_channel;
use bandage_core::{AdapterEvent, BtleplugAdapter, RadioAdapter};

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, ScannedDevice, format_scan_json, format_scan_text};
use crate::util::write_output;

pub async fn cmd_scan(
    timeout: u64,
    format: OutputFormat,
    target_name: &str,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    let (tx, mut rx) = default_adapter_channel();
    let adapter = BtleplugAdapter::new(tx)
        .await
        .context("Failed to open Bluetooth adapter")?;

    if !quiet && format == OutputFormat::Text {
        eprintln!("Scanning for {}s...", timeout);
    }
    adapter.scan().await.context("Failed to start scan")?;

    let mut devices: Vec<ScannedDevice> = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(timeout);
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => break,
            event = rx.recv() => match event {
                Some(AdapterEvent::DeviceDiscovered { device, name }) => {
                    record(&mut devices, device.to_string(), name, target_name);
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    if let Err(e) = adapter.stop_scan().await {
        tracing::warn!("Failed to stop scan: {}", e);
    }

    // Target first, then by name
    devices.sort_by(|a, b| b.target.cmp(&a.target).then_with(|| a.name.cmp(&b.name)));

    let content = match format {
        OutputFormat::Json => format_scan_json(&devices, opts)?,
        OutputFormat::Text => format_scan_text(&devices, opts),
    };
    write_output(&content)
}

/// Add or update a device; later advertisements may carry the name.
fn record(devices: &mut Vec<ScannedDevice>, id: String, name: Option<String>, target_name: &str) {
    let target = name.as_deref() == Some(target_name);
    match devices.iter_mut().find(|d| d.id == id) {
        Some(existing) => {
            if name.is_some() {
                existing.name = name;
                existing.target = target;
            }
        }
        None => devices.push(ScannedDevice { id, name, target }),
    }
}
