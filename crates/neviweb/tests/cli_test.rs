//! Integration tests for the `neviweb` CLI binary.
//!
//! Argument parsing, help output, completions and error paths run without
//! any backend. The end-to-end tests point a profile at a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NONEXISTENT: &str = "/tmp/neviweb-cli-test-nonexistent";

/// Build a [`Command`] for the `neviweb` binary with env isolation.
///
/// Clears all `NEVIWEB_*` env vars and points config directories at
/// `config_home` so tests never touch the user's real configuration.
fn neviweb_cmd_in(config_home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("neviweb");
    cmd.env("HOME", config_home)
        .env("XDG_CONFIG_HOME", config_home)
        .env("XDG_DATA_HOME", config_home)
        .env_remove("NEVIWEB_PROFILE")
        .env_remove("NEVIWEB_USERNAME")
        .env_remove("NEVIWEB_PASSWORD")
        .env_remove("NEVIWEB_OUTPUT")
        .env_remove("NEVIWEB_TIMEOUT")
        .env_remove("RUST_LOG")
        .write_stdin("");
    cmd
}

fn neviweb_cmd() -> assert_cmd::Command {
    neviweb_cmd_in(Path::new(NONEXISTENT))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = neviweb_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    neviweb_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Neviweb")
            .and(predicate::str::contains("networks"))
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("attributes"))
            .and(predicate::str::contains("poll")),
    );
}

#[test]
fn test_version_flag() {
    neviweb_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("neviweb"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_for_common_shells() {
    for shell in ["bash", "zsh", "fish"] {
        neviweb_cmd()
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
}

// ── Parse errors ────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = neviweb_cmd().arg("thermostats").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_output_format() {
    let output = neviweb_cmd()
        .args(["-o", "xml", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("invalid value"));
}

#[test]
fn test_occupancy_rejects_unknown_mode() {
    let output = neviweb_cmd()
        .args(["networks", "occupancy", "Chalet", "vacation"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_attributes_set_requires_payload() {
    let output = neviweb_cmd()
        .args(["attributes", "set", "Salon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Subcommand help ─────────────────────────────────────────────────

#[test]
fn test_subcommand_help_lists_actions() {
    neviweb_cmd()
        .args(["devices", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("status"))
                .and(predicate::str::contains("alert"))
                .and(predicate::str::contains("error-code")),
        );
    neviweb_cmd()
        .args(["networks", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("occupancy"));
}

// ── Missing configuration ───────────────────────────────────────────

#[test]
fn test_devices_without_credentials_fails() {
    let output = neviweb_cmd().args(["devices", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("No credentials") || text.contains("credentials"),
        "Expected a credentials hint:\n{text}"
    );
}

#[test]
fn test_unknown_profile_fails() {
    let output = neviweb_cmd()
        .args(["-p", "cottage", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("cottage"));
}

#[test]
fn test_config_show_without_file() {
    neviweb_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_path_mentions_file_name() {
    neviweb_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Config round trip ───────────────────────────────────────────────

#[test]
fn test_config_init_then_show_redacts_password() {
    let home = tempfile::tempdir().unwrap();

    neviweb_cmd_in(home.path())
        .args([
            "config",
            "init",
            "--username",
            "me@example.com",
            "--network",
            "Chalet",
        ])
        .assert()
        .success();

    let file = home.path().join("neviweb").join("config.toml");
    let mut text = std::fs::read_to_string(&file).unwrap();
    assert!(text.contains("me@example.com"));
    text.push_str("password = \"hunter2\"\n");
    std::fs::write(&file, text).unwrap();

    let output = neviweb_cmd_in(home.path())
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Chalet"));
    assert!(stdout.contains("****"));
    assert!(!stdout.contains("hunter2"), "password leaked:\n{stdout}");
}

// ── End to end against a mock backend ───────────────────────────────

async fn mock_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session": "sess-cli",
            "account": { "id": 77 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 10, "name": "Chalet", "mode": "home" },
            { "id": 11, "name": "Garage" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("location$id", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Salon" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device/1/attribute"))
        .and(query_param("attributes", "signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "signature": { "model": 1123, "softVersion": {"major": 1, "middle": 4, "minor": 2} }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/device/1/attribute"))
        .and(query_param("attributes", "roomSetpoint"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "roomSetpoint": 21.5 })))
        .mount(&server)
        .await;
    server
}

fn write_profile(home: &Path, server: &MockServer) {
    let dir = home.join("neviweb");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        format!(
            "default_profile = \"home\"\n\n\
             [profiles.home]\n\
             username = \"me@example.com\"\n\
             network = \"Chalet\"\n\
             base_url = \"{}\"\n",
            server.uri()
        ),
    )
    .unwrap();
}

async fn run_cli(home: &Path, args: &[&str]) -> std::process::Output {
    let home = home.to_path_buf();
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        neviweb_cmd_in(&home)
            .env("NEVIWEB_PASSWORD", "hunter2")
            .args(&args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_against_mock() {
    let server = mock_backend().await;
    let home = tempfile::tempdir().unwrap();
    write_profile(home.path(), &server);

    let output = run_cli(home.path(), &["-o", "plain", "devices", "list"]).await;
    assert!(
        output.status.success(),
        "command failed:\n{}",
        combined_output(&output)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_networks_list_marks_selection() {
    let server = mock_backend().await;
    let home = tempfile::tempdir().unwrap();
    write_profile(home.path(), &server);

    let output = run_cli(home.path(), &["-o", "json", "networks", "list"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["name"], "Chalet");
    assert_eq!(value[0]["slot"], "primary");
    assert_eq!(value[1]["slot"], serde_json::Value::Null);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_attribute_get_by_device_name() {
    let server = mock_backend().await;
    let home = tempfile::tempdir().unwrap();
    write_profile(home.path(), &server);

    let output = run_cli(
        home.path(),
        &["-o", "json", "attributes", "get", "salon", "roomSetpoint"],
    )
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["roomSetpoint"], 21.5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_device_exits_not_found() {
    let server = mock_backend().await;
    let home = tempfile::tempdir().unwrap();
    write_profile(home.path(), &server);

    let output = run_cli(home.path(), &["devices", "status", "Cuisine"]).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Cuisine"));
}
