//! CLI integration tests

use std::process::Command;
use tempfile::TempDir;

fn lfd(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "livefeed-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = lfd(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("livefeed"), "Should describe the tool");
    assert!(stdout.contains("entities"), "Should show entities command");
    assert!(stdout.contains("show"), "Should show show command");
    assert!(stdout.contains("series"), "Should show series command");
    assert!(stdout.contains("watch"), "Should show watch command");
    assert!(stdout.contains("--data-dir"), "Should show data dir option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = lfd(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("lfd"), "Should show binary name");
}

/// Test show subcommand help
#[test]
fn test_show_help() {
    let output = lfd(&["show", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "show help should succeed");
    assert!(stdout.contains("--select"), "Should show select option");
    assert!(stdout.contains("--format"), "Should show format option");
}

/// A sink that was never written reads as header-only
#[test]
fn test_show_before_first_round() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().to_str().unwrap();

    let output = lfd(&["--data-dir", data_dir, "show", "stocks", "--format", "json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "show should succeed on a missing sink");
    let table: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        table["headers"],
        serde_json::json!(["Company", "Ticker", "Time", "Price"])
    );
    assert_eq!(table["rows"].as_array().unwrap().len(), 0);
}

/// Selection filters rows and keeps sink order
#[test]
fn test_show_selected_rows() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("locations.csv"),
        "Location,Latitude,Longitude,Time,Temp_F\n\
         ELY MN,47.903237,-91.867087,2024-01-01 10:00:00,70\n\
         Death Valley CA,36.5323,-116.93,2024-01-01 10:00:00,76\n\
         ELY MN,47.903237,-91.867087,2024-01-01 10:01:00,71\n",
    )
    .unwrap();
    let data_dir = dir.path().to_str().unwrap();

    let output = lfd(&[
        "--data-dir",
        data_dir,
        "show",
        "locations",
        "--select",
        "ELY MN",
        "--format",
        "json",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "show should succeed");
    let table: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = table["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][4], "70");
    assert_eq!(rows[1][4], "71");
}

/// Unknown names fail with a diagnostic
#[test]
fn test_unknown_domain_and_entity() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().to_str().unwrap();

    let output = lfd(&["--data-dir", data_dir, "show", "bonds"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bonds"));

    let output = lfd(&["--data-dir", data_dir, "show", "stocks", "--select", "Tesla"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Tesla"));
}
