use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

use crate::support::{DeviceScript, FakeRos};

/// Contract tests for `o4n-ros command`

fn o4n_ros() -> Command {
    let mut cmd = Command::cargo_bin("o4n-ros").unwrap();
    cmd.env_remove("O4N_ROS_PASSWORD")
        .env_remove("O4N_ROS_INVENTORY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_modules_and_protocols() {
    o4n_ros()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("command"))
        .stdout(predicate::str::contains("facts"))
        .stdout(predicate::str::contains("SSH"))
        .stdout(predicate::str::contains("Telnet"));
}

#[test]
fn test_command_requires_commands() {
    o4n_ros()
        .args(["command", "--host", "10.0.0.1", "-u", "admin", "--password", "admin"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("At least one command is required"));
}

#[test]
fn test_command_requires_host() {
    o4n_ros()
        .args(["command", "-u", "admin", "--password", "admin", "-c", "cls"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing required argument: host"));
}

#[test]
fn test_command_rejects_unknown_protocol() {
    o4n_ros()
        .args(["command", "--host", "h", "--protocol", "serial", "-c", "cls"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ssh, telnet"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_over_telnet_json() {
    let device = FakeRos::start(DeviceScript::default()).await;
    let port = device.port().to_string();

    let output = tokio::task::spawn_blocking(move || {
        o4n_ros()
            .args([
                "command", "--protocol", "telnet", "--host", "127.0.0.1", "--port", &port,
                "-u", "admin", "--password", "admin", "--telnet-timeout", "1",
                "-c", "sql select Serial Number , Main Version from productinfo", "--json",
            ])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    })
    .await
    .unwrap();

    let result: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["failed"], Value::Bool(false));
    assert_eq!(result["changed"], Value::Bool(false));
    assert!(result["content"].as_str().unwrap().contains("RUME924058381"));
    assert!(result.get("msg").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_authentication_failure_json() {
    let device = FakeRos::start(DeviceScript::default()).await;
    let port = device.port().to_string();

    let output = tokio::task::spawn_blocking(move || {
        o4n_ros()
            .args([
                "command", "--protocol", "telnet", "--host", "127.0.0.1", "--port", &port,
                "-u", "admin", "--password", "wrong", "--telnet-timeout", "1",
                "-c", "cls", "--json",
            ])
            .assert()
            .code(1)
            .get_output()
            .stdout
            .clone()
    })
    .await
    .unwrap();

    let result: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["failed"], Value::Bool(true));
    assert!(result["msg"]
        .as_str()
        .unwrap()
        .starts_with("O4N_ERROR: Telnet Authentication Exception."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_password_from_environment_and_args_file() {
    let device = FakeRos::start(DeviceScript::default()).await;
    let dir = TempDir::new().unwrap();
    let args_path = dir.path().join("args.json");
    fs::write(
        &args_path,
        format!(
            r#"{{"ANSIBLE_MODULE_ARGS": {{
                "host": "127.0.0.1",
                "protocol": "telnet",
                "port": "{}",
                "user": "admin",
                "commands": ["cls"],
                "telnet_timeout": 1,
                "_ansible_no_log": false
            }}}}"#,
            device.port()
        ),
    )
    .unwrap();

    tokio::task::spawn_blocking(move || {
        o4n_ros()
            .env("O4N_ROS_PASSWORD", "admin")
            .args(["command", "--args-file"])
            .arg(&args_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("RS900>"));
    })
    .await
    .unwrap();
}

#[test]
fn test_command_unreachable_device() {
    // Bind and release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
        .to_string();

    o4n_ros()
        .args([
            "command", "--protocol", "telnet", "--host", "127.0.0.1", "--port", &port,
            "-u", "admin", "--password", "admin", "--telnet-timeout", "2", "-c", "cls",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("O4N_ERROR: Telnet Connection Exception (a)"));
}
