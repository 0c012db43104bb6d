//! Config command implementation.

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::util::write_output;

pub fn cmd_config(action: ConfigAction, config: &Config, quiet: bool) -> Result<()> {
    match action {
        ConfigAction::Path => write_output(&format!("{}\n", Config::path().display())),
        ConfigAction::Show => {
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            if content.trim().is_empty() {
                write_output("# using defaults\n")
            } else {
                write_output(&content)
            }
        }
        ConfigAction::Init => {
            let path = Config::path();
            if path.exists() {
                if !quiet {
                    eprintln!("Config already exists: {}", path.display());
                }
                return Ok(());
            }
            Config::default().save()?;
            if !quiet {
                eprintln!("Created {}", path.display());
            }
            Ok(())
        }
    }
}
