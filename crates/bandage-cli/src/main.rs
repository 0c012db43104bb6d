//! Command-line interface for the Smart Bandage wireless sensor.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scan` | List nearby BLE devices, marking the bandage |
//! | `watch` | Stream temperature/humidity with status messages |
//! | `motor` | Switch the vibration motor on or off |
//! | `config` | Manage CLI configuration |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! Settings are read from `<config dir>/smart-bandage/config.toml`. The
//! `BANDAGE_DEVICE` environment variable overrides the configured device
//! name, and `--device` overrides both.

mod cli;
mod commands;
mod config;
mod format;
mod util;

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use bandage_core::uuid::DEVICE_NAME;

use crate::cli::{Cli, Commands};
use crate::commands::{WatchArgs, cmd_config, cmd_motor, cmd_scan, cmd_watch};
use crate::config::Config;
use crate::format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "bandage", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load();
    let opts = FormatOptions::new(cli.no_color || config.no_color, cli.compact);

    match cli.command {
        Commands::Scan { timeout, format } => {
            let target = config.device_name.as_deref().unwrap_or(DEVICE_NAME);
            cmd_scan(timeout, format, target, cli.quiet, &opts).await?;
        }
        Commands::Watch {
            device,
            count,
            format,
            lang,
        } => {
            cmd_watch(WatchArgs {
                device: device.device,
                timeout: Duration::from_secs(device.timeout),
                count,
                format,
                language: lang,
                quiet: cli.quiet,
                config: &config,
                opts: &opts,
            })
            .await?;
        }
        Commands::Motor { action, device } => {
            cmd_motor(
                action.into(),
                device.device,
                Duration::from_secs(device.timeout),
                &config,
                cli.quiet,
            )
            .await?;
        }
        Commands::Config { action } => {
            cmd_config(action, &config, cli.quiet)?;
        }
        // Already handled before tracing init
        Commands::Completions { .. } => {}
    }

    Ok(())
}
