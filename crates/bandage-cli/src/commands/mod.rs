//! Command implementations for the CLI.

mod config;
mod motor;
mod scan;
mod watch;

pub use config::cmd_config;
pub use motor::cmd_motor;
pub use scan::cmd_scan;
pub use watch::{WatchArgs, cmd_watch};
