use std::time::Duration;

use o4n_ros::models::connection::{ConnectionSettings, Protocol};
use o4n_ros::services::command_runner::{CommandRunner, DeviceTarget};
use o4n_ros::services::telnet::TelnetTiming;
use o4n_ros::utils::error::{LoginStage, O4nError};

use crate::support::{DeviceScript, FakeRos, HangUp};

fn fast_runner() -> CommandRunner {
    CommandRunner::with_telnet_timing(TelnetTiming {
        settle: Duration::from_millis(50),
        command_gap: Duration::from_millis(10),
    })
}

fn settings_for(device: &FakeRos, password: &str) -> ConnectionSettings {
    ConnectionSettings::new(
        "127.0.0.1".to_string(),
        Protocol::Telnet,
        "admin".to_string(),
        password.to_string(),
    )
    .with_port(device.port())
    .with_telnet_timeout(1)
}

#[tokio::test]
async fn test_telnet_runs_commands_and_captures_screen() {
    let device = FakeRos::start(DeviceScript::default()).await;
    let commands = vec!["sql select Serial Number , Main Version from productinfo".to_string()];

    let output = fast_runner()
        .run_commands(&settings_for(&device, "admin"), &commands)
        .await
        .unwrap();

    assert!(output.contains("sql select Serial Number , Main Version from productinfo"));
    assert!(output.contains("RUME924058381"));
    assert!(output.contains("1 records selected"));
    assert!(output.ends_with(">    "));

    let lines = device.lines();
    assert_eq!(lines[0], "admin");
    assert_eq!(lines[1], "admin");
    assert_eq!(lines[2], "cls");
    assert_eq!(lines[3], "");
    assert_eq!(lines[4], commands[0]);
    assert_eq!(lines[5], "    ");
}

#[tokio::test]
async fn test_telnet_wrong_password_is_authentication_error() {
    let device = FakeRos::start(DeviceScript::default()).await;

    let err = fast_runner()
        .run_commands(&settings_for(&device, "wrong"), &["cls".to_string()])
        .await
        .unwrap_err();

    match err {
        O4nError::TelnetAuthentication { settings } => {
            assert_eq!(settings, format!("admin@127.0.0.1:{}", device.port()));
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_telnet_connection_dropped_before_login() {
    let device = FakeRos::start(DeviceScript {
        hang_up: HangUp::OnAccept,
        ..Default::default()
    })
    .await;

    let err = fast_runner()
        .run_commands(&settings_for(&device, "admin"), &["cls".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        O4nError::TelnetConnection { stage: LoginStage::UserPrompt, .. }
    ));
    assert!(err
        .to_string()
        .starts_with("O4N_ERROR: Telnet Connection Exception (b)\nConnection settings: admin@127.0.0.1:"));
}

#[tokio::test]
async fn test_telnet_connection_dropped_after_user_name() {
    let device = FakeRos::start(DeviceScript {
        hang_up: HangUp::AfterUserName,
        ..Default::default()
    })
    .await;

    let err = fast_runner()
        .run_commands(&settings_for(&device, "admin"), &["cls".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        O4nError::TelnetConnection { stage: LoginStage::PasswordPrompt, .. }
    ));
    assert!(err
        .to_string()
        .starts_with("O4N_ERROR: Telnet Connection Exception (c)\nConnection settings: admin@127.0.0.1:"));
}

#[tokio::test]
async fn test_telnet_connection_dropped_after_password() {
    let device = FakeRos::start(DeviceScript {
        hang_up: HangUp::AfterPassword,
        ..Default::default()
    })
    .await;

    let err = fast_runner()
        .run_commands(&settings_for(&device, "admin"), &["cls".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        O4nError::TelnetConnection { stage: LoginStage::CliShell, .. }
    ));
    assert!(err
        .to_string()
        .starts_with("O4N_ERROR: Telnet Connection Exception (d)\n"));
}

#[tokio::test]
async fn test_telnet_connection_dropped_before_finish_marker_echo() {
    let device = FakeRos::start(DeviceScript {
        hang_up: HangUp::AfterLogin,
        ..Default::default()
    })
    .await;

    let err = fast_runner()
        .run_commands(&settings_for(&device, "admin"), &["cls".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, O4nError::TelnetCommand(_)));
    assert!(err
        .to_string()
        .starts_with("O4N_ERROR: Telnet Command Exception \n"));
}

#[tokio::test]
async fn test_run_all_reports_each_device() {
    let good = FakeRos::start(DeviceScript::default()).await;
    let bad = FakeRos::start(DeviceScript::default()).await;
    let targets = vec![
        DeviceTarget::named("good", settings_for(&good, "admin")),
        DeviceTarget::named("bad", settings_for(&bad, "nope")),
    ];

    let results = fast_runner().run_all(&targets, &["cls".to_string()]).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].device.as_deref(), Some("good"));
    assert!(!results[0].failed);
    assert!(results[0].content.is_some());
    assert_eq!(results[1].device.as_deref(), Some("bad"));
    assert!(results[1].failed);
    assert!(results[1]
        .msg
        .as_deref()
        .unwrap()
        .starts_with("O4N_ERROR: Telnet Authentication Exception."));
}
