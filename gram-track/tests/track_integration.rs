//! Integration tests for gram-track
//!
//! Only the offline paths are exercised: history display, and the
//! already-sampled-today short circuit that keeps trackers off the network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, String, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();

    let store_dir = temp_dir.path().join("store");
    fs::create_dir_all(&store_dir).unwrap();

    let token_path = temp_dir.path().join("graph.token");
    fs::write(&token_path, "EAATESTTOKEN").unwrap();

    let config_path = temp_dir.path().join("config.toml");
    let config_content = format!(
        r#"
[api]
app_id = "1047562113346147"
token_file = "{}"
base_url = "http://127.0.0.1:9"

[store]
dir = "{}"
"#,
        token_path.display(),
        store_dir.display()
    );
    fs::write(&config_path, config_content).unwrap();

    (
        temp_dir,
        config_path.to_string_lossy().to_string(),
        store_dir,
    )
}

fn cmd(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("gram-track").unwrap();
    cmd.env("GRAMCAST_CONFIG", config_path);
    cmd.env_remove("GRAMCAST_TOKEN");
    cmd
}

#[test]
fn test_history_empty() {
    let (_temp, config_path, _store) = setup_test_env();

    cmd(&config_path)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No follower history"));
}

#[test]
fn test_history_shows_daily_deltas() {
    let (_temp, config_path, store_dir) = setup_test_env();
    fs::write(
        store_dir.join("followers_history.json"),
        r#"{"2026-08-05": 100, "2026-08-06": 97, "2026-08-07": 105}"#,
    )
    .unwrap();

    cmd(&config_path)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-08-05: 100 followers"))
        .stdout(predicate::str::contains("2026-08-06: 97 followers (-3)"))
        .stdout(predicate::str::contains("2026-08-07: 105 followers (+8)"));
}

#[test]
fn test_history_json_output() {
    let (_temp, config_path, store_dir) = setup_test_env();
    fs::write(
        store_dir.join("followers_history.json"),
        r#"{"2026-08-07": 105}"#,
    )
    .unwrap();

    let output = cmd(&config_path)
        .args(["history", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(parsed["2026-08-07"], 105);
}

#[test]
fn test_history_rejects_unknown_format() {
    let (_temp, config_path, _store) = setup_test_env();

    cmd(&config_path)
        .args(["history", "--format", "csv"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_followers_skips_api_when_already_sampled_today() {
    let (_temp, config_path, store_dir) = setup_test_env();
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d");
    fs::write(
        store_dir.join("followers_history.json"),
        format!(r#"{{"{}": 105}}"#, today),
    )
    .unwrap();

    // The API endpoint is unreachable, so success proves no request was made
    cmd(&config_path).arg("followers").assert().success();
}

#[test]
fn test_followers_fails_when_api_unreachable() {
    let (_temp, config_path, _store) = setup_test_env();

    cmd(&config_path).arg("followers").assert().failure().code(1);
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("gram-track")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("followers"))
        .stdout(predicate::str::contains("demographics"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("insights"));
}
