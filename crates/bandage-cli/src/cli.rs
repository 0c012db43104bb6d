//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

use bandage_types::{Command, Language};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reusable device connection arguments
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// Advertised device name, or use BANDAGE_DEVICE env var
    #[arg(short, long, env = "BANDAGE_DEVICE")]
    pub device: Option<String>,

    /// Seconds to wait for the session to become ready
    #[arg(short = 'T', long, default_value = "30")]
    pub timeout: u64,
}

#[derive(Parser)]
#[command(name = "bandage")]
#[command(author, version, about = "CLI for the Smart Bandage wireless sensor", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan for nearby BLE devices
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Connect and stream temperature/humidity readings
    Watch {
        #[command(flatten)]
        device: DeviceArgs,

        /// Stop after this many readings (0 for unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        count: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Message language (ja, en)
        #[arg(short, long)]
        lang: Option<Language>,
    },

    /// Switch the vibration motor on or off
    Motor {
        /// Motor action
        #[arg(value_enum)]
        action: MotorAction,

        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Motor actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MotorAction {
    /// Start vibration
    On,
    /// Stop vibration
    Off,
}

impl From<MotorAction> for Command {
    fn from(action: MotorAction) -> Self {
        match action {
            MotorAction::On => Command::MotorOn,
            MotorAction::Off => Command::MotorOff,
        }
    }
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch_with_language() {
        let cli = Cli::try_parse_from(["bandage", "watch", "--lang", "en", "-n", "5"]).unwrap();
        match cli.command {
            Commands::Watch { count, lang, .. } => {
                assert_eq!(count, 5);
                assert_eq!(lang, Some(Language::English));
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_parse_motor_action() {
        let cli = Cli::try_parse_from(["bandage", "motor", "on", "-T", "10"]).unwrap();
        match cli.command {
            Commands::Motor { action, device } => {
                assert_eq!(Command::from(action), Command::MotorOn);
                assert_eq!(device.timeout, 10);
            }
            _ => panic!("expected motor"),
        }
    }

    #[test]
    fn test_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["bandage", "watch", "--lang", "fr"]).is_err());
    }
}
