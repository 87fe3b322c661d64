//! Smoke tests for the panel-probe CLI
//!
//! Everything runs against the simulated backend with a ledger in a temp dir.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command for the panel-probe binary, isolated from the caller's panel
fn panel_probe() -> Command {
    let mut cmd = Command::cargo_bin("panel-probe").expect("panel-probe binary should exist");
    for var in ["BASE_URL", "LOGIN_EMAIL", "LOGIN_PASSWORD", "CLIENT_ID", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn with_ledger(dir: &TempDir) -> Command {
    let mut cmd = panel_probe();
    cmd.arg("--ledger").arg(dir.path().join("ledger.json"));
    cmd
}

fn read_ledger(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    panel_probe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    panel_probe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cleanup"))
        .stdout(predicate::str::contains("ledger"))
        .stdout(predicate::str::contains("--backend"));
}

#[test]
fn test_no_args_fails() {
    panel_probe().assert().failure();
}

// ============================================================================
// Scenario Listing
// ============================================================================

#[test]
fn test_list_all_suites() {
    panel_probe()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "login::valid_credentials_reach_dashboard",
        ))
        .stdout(predicate::str::contains("domains::delete_domain_with_user_fails"))
        .stdout(predicate::str::contains("profile_params::delete_unused_param"))
        .stdout(predicate::str::contains("users::number_field_rejects_text"));
}

#[test]
fn test_list_with_filter() {
    panel_probe()
        .args(["list", "--filter", "^login::"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login::logout_returns_to_login"))
        .stdout(predicate::str::contains("domains::").not());
}

#[test]
fn test_list_with_invalid_filter() {
    panel_probe()
        .args(["list", "--filter", "(unclosed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid filter"));
}

// ============================================================================
// Ledger Maintenance
// ============================================================================

#[test]
fn test_ledger_show_missing_file() {
    let dir = TempDir::new().unwrap();
    with_ledger(&dir)
        .args(["ledger", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("users (0)"))
        .stdout(predicate::str::contains("domains (0)"));
    assert!(!dir.path().join("ledger.json").exists());
}

#[test]
fn test_ledger_untrack_and_show_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(
        &path,
        r#"{"users":["bob"],"params":["age"],"domains":["acme123"]}"#,
    )
    .unwrap();

    with_ledger(&dir)
        .args(["ledger", "untrack", "user", "bob"])
        .assert()
        .success();
    with_ledger(&dir)
        .args(["ledger", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme123"))
        .stdout(predicate::str::contains("bob").not());

    let state = read_ledger(&path);
    assert_eq!(state["params"], serde_json::json!(["age"]));
}

#[test]
fn test_ledger_reset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    fs::write(&path, r#"{"users":["bob"],"params":[],"domains":["acme123"]}"#).unwrap();

    with_ledger(&dir).args(["ledger", "reset"]).assert().success();

    let state = read_ledger(&path);
    assert_eq!(
        state,
        serde_json::json!({"users": [], "params": [], "domains": []})
    );
}

#[test]
fn test_corrupt_ledger_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("ledger.json"), "not json").unwrap();

    with_ledger(&dir)
        .args(["ledger", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corrupt"));
}

#[test]
fn test_unknown_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    with_ledger(&dir)
        .args(["ledger", "untrack", "tenant", "x"])
        .assert()
        .failure();
}

// ============================================================================
// Test and Cleanup Phases (simulated backend)
// ============================================================================

#[test]
fn test_run_cleans_up_after_itself() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("results");
    with_ledger(&dir)
        .args(["-q", "run", "--filter", "^(domains|profile_params)::", "-j", "2"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let state = read_ledger(&dir.path().join("ledger.json"));
    assert_eq!(
        state,
        serde_json::json!({"users": [], "params": [], "domains": []})
    );
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["backend"], "simulated");
}

#[test]
fn test_entities_survive_between_processes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    with_ledger(&dir)
        .args(["-q", "test", "--filter", "domains::create_with_valid_values"])
        .arg("--output")
        .arg(dir.path().join("results"))
        .assert()
        .success();
    let domains = read_ledger(&path)["domains"].as_array().unwrap().len();
    assert_eq!(domains, 1);

    // a new process starts with an empty simulated panel
    with_ledger(&dir)
        .arg("cleanup")
        .assert()
        .success()
        .stderr(predicate::str::contains("not found on the panel"));
    assert_eq!(read_ledger(&path)["domains"].as_array().unwrap().len(), 1);

    with_ledger(&dir)
        .args(["cleanup", "--prune-missing"])
        .assert()
        .success();
    assert!(read_ledger(&path)["domains"].as_array().unwrap().is_empty());
}

#[test]
fn test_browser_backend_needs_target() {
    let dir = TempDir::new().unwrap();
    with_ledger(&dir)
        .args(["--backend", "browser", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--base-url"));
}
