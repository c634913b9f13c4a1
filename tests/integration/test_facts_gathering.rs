use std::time::Duration;

use o4n_ros::models::connection::{ConnectionSettings, Protocol};
use o4n_ros::services::command_runner::{CommandRunner, DeviceTarget};
use o4n_ros::services::facts_collector::{FactsCollector, FACTS_QUERIES};
use o4n_ros::services::telnet::TelnetTiming;

use crate::support::{DeviceScript, FakeRos};

fn collector() -> FactsCollector {
    FactsCollector::new(CommandRunner::with_telnet_timing(TelnetTiming {
        settle: Duration::from_millis(50),
        command_gap: Duration::from_millis(10),
    }))
}

fn settings_for(device: &FakeRos) -> ConnectionSettings {
    ConnectionSettings::new(
        "127.0.0.1".to_string(),
        Protocol::Telnet,
        "admin".to_string(),
        "admin".to_string(),
    )
    .with_port(device.port())
    .with_telnet_timeout(1)
}

#[tokio::test]
async fn test_gather_productinfo_facts_over_telnet() {
    let device = FakeRos::start(DeviceScript::default()).await;

    let (facts, output) = collector().gather(&settings_for(&device)).await.unwrap();

    assert_eq!(facts.serial_number.as_deref(), Some("RUME924058381"));
    assert_eq!(facts.main_version.as_deref(), Some("v4.1.0 (May 09 2014 16:39)"));
    assert_eq!(facts.mac_address.as_deref(), Some("94-B8-C5-F9-75-80"));
    assert_eq!(facts.order_code.as_deref(), Some("RS900-HI-D-L2-L2-00"));
    assert_eq!(facts.hardware_id.as_deref(), Some("RS900 (v2, 40-00-0066)"));
    assert!(output.contains("records selected"));

    let lines = device.lines();
    for query in FACTS_QUERIES {
        assert!(lines.iter().any(|line| line == query), "query not sent: {query}");
    }
}

#[tokio::test]
async fn test_gather_module_wraps_facts() {
    let device = FakeRos::start(DeviceScript {
        responses: Default::default(),
        ..Default::default()
    })
    .await;
    let target = DeviceTarget::named("bare", settings_for(&device));

    let result = collector().gather_module(&target).await;

    assert!(!result.failed);
    assert_eq!(result.device.as_deref(), Some("bare"));
    let facts = result.ansible_facts.unwrap();
    assert!(facts.is_empty());
    assert!(result.content.unwrap().contains("Unknown command"));
}
