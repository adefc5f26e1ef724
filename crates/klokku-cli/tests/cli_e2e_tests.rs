//! End-to-end tests for the klokku binary
//!
//! These tests run the real binary against a wiremock server and validate:
//! - Table and JSON output for each command
//! - Login failures and missing configuration
//! - Config file handling

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn users_payload() -> serde_json::Value {
    serde_json::json!([
        {"id": 123, "username": "testuser", "displayName": "Test User"},
        {"id": 456, "username": "otheruser", "displayName": "Other User"}
    ])
}

async fn mount_users(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(users_payload()))
        .mount(server)
        .await;
}

/// Command isolated from the caller's environment and config
fn klokku(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("klokku").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("KLOKKU_URL")
        .env_remove("KLOKKU_USERNAME")
        .env_remove("KLOKKU_TOKEN")
        .env_remove("KLOKKU_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_path(dir));
    cmd
}

fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("config.json")
}

#[tokio::test]
async fn test_users_table() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "--username", "testuser", "users"])
        .assert()
        .success()
        .stdout(predicate::str::contains("USERNAME"))
        .stdout(predicate::str::contains("testuser"))
        .stdout(predicate::str::contains("Other User"));
}

#[tokio::test]
async fn test_login_remembers_username() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "--username", "testuser", "users"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(config_path(&dir)).unwrap();
    assert!(saved.contains("\"last_username\": \"testuser\""));

    // The stored username is used when none is given
    klokku(&dir)
        .args(["--url", &server.uri(), "users"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test User"));
}

#[tokio::test]
async fn test_budgets_json() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/budget"))
        .and(header("x-user-id", "123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "name": "Budget 1", "weeklyTime": 3600, "icon": "icon1", "startDate": "2024-09-08T00:00:00Z"}
        ])))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let output = klokku(&dir)
        .args(["--url", &server.uri(), "-u", "testuser", "--json", "budgets"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let budgets: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(budgets[0]["name"], "Budget 1");
    assert_eq!(budgets[0]["weeklyTime"], 3600);
}

#[tokio::test]
async fn test_current_event() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/event/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "startTime": "2023-01-01T12:00:00Z",
            "budget": {"id": 1, "name": "Budget 1", "weeklyTime": 3600}
        })))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "-u", "testuser", "current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracking 'Budget 1'"))
        .stdout(predicate::str::contains("Jan 01, 2023 12:00"));
}

#[tokio::test]
async fn test_current_event_none() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/event/current"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "-u", "testuser", "current"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No event is currently being tracked"));
}

#[tokio::test]
async fn test_switch_budget() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/event"))
        .and(header("x-user-id", "123"))
        .and(body_json(serde_json::json!({"budgetId": 7})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "-u", "testuser", "switch", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to budget 7"));
}

#[tokio::test]
async fn test_server_error_fails() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/budget"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "-u", "testuser", "budgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server error 500"));
}

#[tokio::test]
async fn test_unknown_user_fails() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "-u", "ghost", "users"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed"))
        .stderr(predicate::str::contains("unknown user 'ghost'"));

    assert!(!config_path(&dir).exists());
}

#[test]
fn test_missing_url_fails() {
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["-u", "testuser", "users"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Klokku server URL configured"));
}

#[test]
fn test_missing_username_fails() {
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", "http://127.0.0.1:9", "users"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No username given"));
}

#[test]
fn test_config_set_and_show() {
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["config", "set", "url", "http://localhost:8181"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved url"));

    klokku(&dir)
        .args(["config", "set", "timeout", "5"])
        .assert()
        .success();

    klokku(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8181"))
        .stdout(predicate::str::contains("timeout (s):       5"));

    klokku(&dir)
        .args(["config", "unset", "timeout"])
        .assert()
        .success();

    klokku(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout (s):       (not set)"));
}

#[test]
fn test_config_set_rejects_bad_number() {
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["config", "set", "retries", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a number"));
}

#[test]
fn test_config_set_rejects_oversized_session_ttl() {
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["config", "set", "session-ttl", &i64::MAX.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid session ttl"));

    assert!(!config_path(&dir).exists());
}

#[tokio::test]
async fn test_oversized_weekly_time_is_listed() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/budget"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 9, "name": "Forever", "weeklyTime": i64::MAX}
        ])))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["--url", &server.uri(), "-u", "testuser", "budgets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forever"));
}

#[tokio::test]
async fn test_stored_url_is_used() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    let dir = TempDir::new().unwrap();

    klokku(&dir)
        .args(["config", "set", "url", &server.uri()])
        .assert()
        .success();

    klokku(&dir)
        .args(["-u", "testuser", "users"])
        .assert()
        .success()
        .stdout(predicate::str::contains("testuser"));
}

#[tokio::test]
async fn test_log_file_is_written() {
    let server = MockServer::start().await;
    mount_users(&server).await;
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("logs").join("klokku.log");

    klokku(&dir)
        .env("RUST_LOG", "klokku_core=info")
        .args(["--url", &server.uri(), "-u", "testuser", "users", "--log-file"])
        .arg(&log_path)
        .assert()
        .success();

    let logs = std::fs::read_to_string(&log_path).unwrap();
    assert!(logs.contains("Authenticated"));
}
