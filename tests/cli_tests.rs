//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn cfgwalk_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cfgwalk"))
}

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path.to_string_lossy().into_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(cfgwalk_bin())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ============================================================================
// Walk Command Tests
// ============================================================================

#[test]
fn test_cli_walk_text() {
    let output = run(&["walk", &fixture("net-system.yin")]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = stdout(&output);
    assert!(text.contains("/system/mgmt-vlan = 1\n"));
    assert!(text.contains("/system/mgmt-vlan = 4094\n"));
    assert!(!text.contains("uptime"));
    assert_eq!(text.lines().filter(|l| *l == "--").count(), 3);
}

#[test]
fn test_cli_walk_json_compact() {
    let output = run(&["walk", &fixture("net-system.yin"), "--format", "json", "--compact"]);
    assert!(output.status.success());

    let text = stdout(&output);
    let payloads: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(payloads.len(), 3);
    assert!(payloads[0]["net-system:system"]["mgmt-vlan"].is_number());
}

#[test]
fn test_cli_walk_xml() {
    let output = run(&["walk", &fixture("net-system.yin"), "--format", "xml", "--compact"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert_eq!(text.lines().filter(|l| l.starts_with("<config>")).count(), 3);
    assert!(text.contains("<mgmt-vlan>2047</mgmt-vlan>"));
}

#[test]
fn test_cli_walk_with_overrides_and_root() {
    let output = run(&[
        "walk",
        &fixture("net-system.yin"),
        &fixture("net-ext.yin"),
        "--overrides",
        &fixture("overrides.json"),
        "--root",
        "/system/banner",
    ]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("/system/banner/disable = <empty-true>"));
    assert!(!text.contains("/system/hostname"));
}

#[test]
fn test_cli_walk_coverage_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("coverage.json");
    let output = run(&[
        "walk",
        &fixture("net-system.yin"),
        "--coverage",
        report.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let text = std::fs::read_to_string(&report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["sessions"], 1);
    assert_eq!(json["rows"], 3);
    assert_eq!(json["leaves_total"], 7);
    assert_eq!(json["leaves_covered"], 7);
}

#[test]
fn test_cli_walk_round_limit() {
    let output = run(&["walk", &fixture("net-system.yin"), "--max-rounds", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: limit exceeded"));
}

// ============================================================================
// Domains Command Tests
// ============================================================================

#[test]
fn test_cli_domains_json() {
    let output = run(&[
        "domains",
        &fixture("net-system.yin"),
        "--leaf",
        "/system/mgmt-vlan",
        "--json",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["/system/mgmt-vlan"], serde_json::json!(["1", "2047", "4094"]));
}

#[test]
fn test_cli_domains_unknown_leaf() {
    let output = run(&["domains", &fixture("net-system.yin"), "--leaf", "/nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_cli_inspect_basic() {
    let output = run(&["inspect", &fixture("net-system.yin")]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Modules: net-system"));
    assert!(text.contains("Choices: 1"));
    assert!(text.contains("=== Tree ==="));
}

#[test]
fn test_cli_inspect_json() {
    let output = run(&["inspect", &fixture("net-system.yin"), "--json"]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["statistics"]["leaves"], 8);
    assert_eq!(json["modules"][0], "net-system");
}

#[test]
fn test_cli_missing_file() {
    let output = run(&["inspect", "/nonexistent/schema.yin"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_cli_help() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("walk"));
    assert!(text.contains("domains"));
    assert!(text.contains("inspect"));
}
