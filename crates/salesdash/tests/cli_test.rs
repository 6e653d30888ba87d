#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn salesdash(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("salesdash").unwrap();
    cmd.current_dir(dir)
        .env_remove("SALESDASH_CONFIG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    salesdash(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sales dashboard"))
        .stdout(predicate::str::contains("up"))
        .stdout(predicate::str::contains("down"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    salesdash(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "salesdash {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_up_help_lists_overrides() {
    let dir = tempfile::tempdir().unwrap();
    salesdash(dir.path())
        .args(["up", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--products"))
        .stdout(predicate::str::contains("--sales"))
        .stdout(predicate::str::contains("--strict-counts"))
        .stdout(predicate::str::contains("--skip-preflight"));
}

#[test]
fn test_config_without_file_prints_defaults() {
    let dir = tempfile::tempdir().unwrap();
    salesdash(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("network: sales-dashboard-net"))
        .stdout(predicate::str::contains("container: sales-postgres"))
        .stdout(predicate::str::contains("row_counts: warn"));
}

#[test]
fn test_config_discovers_local_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("salesdash.yaml"),
        "network: custom-net\npublish:\n  port: 18080\n",
    )
    .unwrap();

    salesdash(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("salesdash.yaml"))
        .stdout(predicate::str::contains("network: custom-net"))
        .stdout(predicate::str::contains("port: 18080"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    salesdash(dir.path())
        .args(["--config", "nope.yaml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_unknown_config_key_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "netwrok: typo\n").unwrap();

    salesdash(dir.path())
        .arg("config")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("salesdash.yaml"),
        "app:\n  host_port: 5432\n",
    )
    .unwrap();

    salesdash(dir.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[cfg(unix)]
#[test]
fn test_up_exits_1_when_a_stage_fails() {
    let dir = tempfile::tempdir().unwrap();
    // `false` stands in for a runtime whose every command fails
    fs::write(dir.path().join("salesdash.yaml"), "runtime: \"false\"\n").unwrap();

    salesdash(dir.path())
        .args(["up", "--skip-preflight"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Stage 1/7 (network) failed"));
}
