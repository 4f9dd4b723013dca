//! Integration tests for the pingate command line
//!
//! Each test runs the built binary against its own temporary
//! configuration directory, feeding prompts through stdin.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::tempdir;

const PINGATE_BINARY: &str = env!("CARGO_BIN_EXE_pingate");

fn run(config_dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(PINGATE_BINARY)
        .args(args)
        .env("PINGATE_CONFIG_DIR", config_dir)
        .env_remove("JOURNAL_STREAM")
        .env("CLICOLOR", "0")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn pingate");

    if let Some(mut input) = child.stdin.take() {
        input
            .write_all(stdin.as_bytes())
            .expect("Failed to write stdin");
    }

    child.wait_with_output().expect("Failed to wait for pingate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_help_lists_commands() {
    let output = Command::new(PINGATE_BINARY)
        .arg("--help")
        .output()
        .expect("Failed to run pingate --help");

    assert!(output.status.success());
    let help = stdout(&output);
    for command in ["status", "set", "change", "enable", "disable", "reset", "clear", "unlock"] {
        assert!(help.contains(command), "help should mention {command}");
    }
}

#[test]
fn test_fresh_install_status() {
    let dir = tempdir().unwrap();
    let output = run(dir.path(), &["status"], "");

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("PIN set:      no"));
    assert!(text.contains("Lock enabled: no"));
    assert!(text.contains("5 attempts, 30s"));
}

#[test]
fn test_set_then_unlock() {
    let dir = tempdir().unwrap();

    let output = run(dir.path(), &["set"], "12\n4321\n4321\n");
    assert!(output.status.success(), "{:?}", output);
    assert!(stdout(&output).contains("PIN set, lock enabled"));

    let output = run(dir.path(), &["unlock"], "0000\n4321\n");
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Incorrect PIN. 4 attempts remaining."));
    assert!(text.contains("Unlocked"));
}

#[test]
fn test_wrong_pins_until_eof_fail() {
    let dir = tempdir().unwrap();
    run(dir.path(), &["reset"], "y\n");

    let output = run(dir.path(), &["unlock"], "0000\n");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_change_with_wrong_current_pin() {
    let dir = tempdir().unwrap();
    run(dir.path(), &["reset"], "y\n");

    let output = run(dir.path(), &["change"], "9999\n5678\n5678\n");
    assert_eq!(output.status.code(), Some(1));

    let output = run(dir.path(), &["unlock"], "1234\n");
    assert!(output.status.success());
}

#[test]
fn test_disable_then_enable_is_not_configured() {
    let dir = tempdir().unwrap();
    run(dir.path(), &["reset"], "y\n");

    let output = run(dir.path(), &["disable"], "y\n");
    assert!(output.status.success());

    let output = run(dir.path(), &["enable"], "");
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("No PIN is stored"));
}

#[test]
fn test_clear_returns_to_unconfigured() {
    let dir = tempdir().unwrap();
    run(dir.path(), &["reset"], "y\n");

    let output = run(dir.path(), &["clear"], "y\n");
    assert!(output.status.success());

    let output = run(dir.path(), &["status"], "");
    assert!(stdout(&output).contains("PIN set:      no"));
}

#[test]
fn test_invalid_config_exits_with_config_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[lockout]\nmax_attempts = 0\n").unwrap();

    let output = run(dir.path(), &["status"], "");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_malformed_config_exits_with_config_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[lockout\n").unwrap();

    let output = run(dir.path(), &["status"], "");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse config file"), "{stderr}");
}
