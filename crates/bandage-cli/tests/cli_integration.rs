//! CLI Integration Tests
//!
//! These tests run the `bandage` binary and check its output for commands
//! that do not need Bluetooth hardware.
//!
//! ```
//! cargo test --package bandage-cli --test cli_integration
//! ```

use std::process::{Command, Output};

fn run_bandage(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bandage"))
        .args(args)
        .env_remove("BANDAGE_DEVICE")
        .output()
        .expect("Failed to run bandage binary")
}

#[test]
fn test_help_lists_commands() {
    let output = run_bandage(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["scan", "watch", "motor", "config", "completions"] {
        assert!(stdout.contains(command), "missing {} in help", command);
    }
}

#[test]
fn test_version() {
    let output = run_bandage(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("bandage "));
}

#[test]
fn test_motor_requires_action() {
    let output = run_bandage(&["motor"]);
    assert!(!output.status.success());

    let output = run_bandage(&["motor", "sideways"]);
    assert!(!output.status.success());
}

#[test]
fn test_watch_rejects_unknown_language() {
    let output = run_bandage(&["watch", "--lang", "fr"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("fr"));
}

#[test]
fn test_completions_bash() {
    let output = run_bandage(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("bandage"));
}

#[test]
fn test_config_path() {
    let output = run_bandage(&["config", "path"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("smart-bandage"));
    assert!(stdout.trim_end().ends_with("config.toml"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_config_init_and_show() {
    let dir = tempfile::TempDir::new().unwrap();
    let run = |args: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_bandage"))
            .args(args)
            .env("XDG_CONFIG_HOME", dir.path())
            .output()
            .expect("Failed to run bandage binary")
    };

    let output = run(&["config", "init"]);
    assert!(output.status.success());
    assert!(dir.path().join("smart-bandage").join("config.toml").exists());

    let output = run(&["config", "show"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no_color = false"));
}
