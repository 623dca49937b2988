//! Integration tests for gram-creds

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();

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
        temp_dir.path().join("store").display()
    );
    fs::write(&config_path, config_content).unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

fn cmd(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("gram-creds").unwrap();
    cmd.env("GRAMCAST_CONFIG", config_path);
    cmd.env_remove("GRAMCAST_TOKEN");
    cmd
}

#[test]
fn test_validate_reports_failure_as_json_with_exit_zero() {
    let (_temp, config_path) = setup_test_env();

    let output = cmd(&config_path)
        .arg("validate")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let verdict: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(verdict["valid"], false);
    assert!(verdict["error"].as_str().is_some());
}

#[test]
fn test_validate_fails_without_token_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let config_content = format!(
        r#"
[api]
app_id = "42"
token_file = "{}"

[store]
dir = "{}"
"#,
        temp_dir.path().join("missing.token").display(),
        temp_dir.path().join("store").display()
    );
    fs::write(&config_path, config_content).unwrap();

    cmd(&config_path.to_string_lossy())
        .arg("validate")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_account_fails_when_api_unreachable() {
    let (_temp, config_path) = setup_test_env();

    cmd(&config_path)
        .arg("account")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("gram-creds")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("account"));
}
