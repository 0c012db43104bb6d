//! Configuration file management.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use bandage_core::SessionConfig;
use bandage_types::Language;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Advertised name of the device to connect to
    #[serde(default)]
    pub device_name: Option<String>,

    /// Language for status messages
    #[serde(default)]
    pub language: Option<Language>,

    /// Readings kept per metric
    #[serde(default)]
    pub history_capacity: Option<usize>,

    /// Give up on service discovery after this many seconds
    #[serde(default)]
    pub discovery_timeout_secs: Option<u64>,

    /// Report an error after this many malformed frames in a row
    #[serde(default)]
    pub max_consecutive_malformed: Option<u32>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smart-bandage")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from a specific path, or return default if not found
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Build the session configuration.
    ///
    /// `device` (from `--device` or `BANDAGE_DEVICE`) overrides the
    /// configured device name.
    pub fn to_session_config(&self, device: Option<String>) -> Result<SessionConfig> {
        let mut session = SessionConfig::default();
        if let Some(name) = device.or_else(|| self.device_name.clone()) {
            session = session.device_name(name);
        }
        if let Some(capacity) = self.history_capacity {
            session = session.history_capacity(capacity);
        }
        if let Some(secs) = self.discovery_timeout_secs {
            session = session.discovery_timeout(Duration::from_secs(secs));
        }
        if let Some(max) = self.max_consecutive_malformed {
            session = session.max_consecutive_malformed(max);
        }
        session.validate().context("Invalid configuration")?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            device_name: Some("Ward 3 Bandage".to_string()),
            language: Some(Language::English),
            discovery_timeout_secs: Some(15),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path);

        assert_eq!(loaded, config);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("language = \"en\""));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "device_name = [not toml").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str("language = \"ja\"").unwrap();
        assert_eq!(config.language, Some(Language::Japanese));
        assert_eq!(config.device_name, None);
        assert!(!config.no_color);
    }

    #[test]
    fn test_session_config_device_override() {
        let config = Config {
            device_name: Some("Configured".to_string()),
            ..Default::default()
        };
        let session = config.to_session_config(None).unwrap();
        assert_eq!(session.device_name, "Configured");

        let session = config
            .to_session_config(Some("From Env".to_string()))
            .unwrap();
        assert_eq!(session.device_name, "From Env");
    }

    #[test]
    fn test_session_config_defaults() {
        let session = Config::default().to_session_config(None).unwrap();
        assert_eq!(session.device_name, "Smart Bandage");
        assert_eq!(session.history_capacity, 10);
        assert_eq!(session.discovery_timeout, None);
    }

    #[test]
    fn test_session_config_rejects_invalid_values() {
        let config = Config {
            history_capacity: Some(0),
            ..Default::default()
        };
        assert!(config.to_session_config(None).is_err());
    }
}
