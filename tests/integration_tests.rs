//! Integration tests for the datarun CLI

use std::io::Write;
use std::process::Command;

fn datarun() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_datarun"));
    command
        .env_remove("DATARUN_ROUTING__API_KEY")
        .env_remove("RUST_LOG");
    command
}

/// Test that the CLI shows help with explicit help flag
#[test]
fn test_cli_help() {
    let output = datarun().arg("--help").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ranks the parks around you"));
    assert!(stdout.contains("recommend"));
    assert!(stdout.contains("load-parks"));
    assert!(stdout.contains("serve"));
}

/// The short help flag prints the one-line summary
#[test]
fn test_cli_short_help() {
    let output = datarun().arg("-h").output().expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Find the best nearby park for a run"));
    assert!(!stdout.contains("Ranks the parks around you"));
}

/// Days beyond the forecast horizon are rejected before anything runs
#[test]
fn test_day_out_of_range() {
    let output = datarun()
        .args(["recommend", "--day", "9", "--yes"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--day"));
}

/// Latitude without longitude is a usage error
#[test]
fn test_latitude_requires_longitude() {
    let output = datarun()
        .args(["recommend", "--lat", "40.41", "--yes"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

/// A recommendation needs a routing key
#[test]
fn test_recommend_without_routing_key() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[logging]\nlevel = \"error\"").unwrap();

    let output = datarun()
        .arg("--config")
        .arg(file.path())
        .args(["recommend", "--day", "0", "--yes"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("routing.api_key"), "unexpected output: {stderr}");
}

/// An invalid configuration file stops the CLI with a configuration error
#[test]
fn test_invalid_config() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[logging]\nlevel = \"loud\"").unwrap();

    let output = datarun()
        .arg("--config")
        .arg(file.path())
        .arg("serve")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid log level"), "unexpected output: {stderr}");
}
