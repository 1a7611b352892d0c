//! Node-level metrics exposition
//!
//! The prometheus registry is process-wide, so only one node per test
//! binary registers collectors; the tests share it serially.

use relaygate_node::{render_metrics, DeliveryNode, NodeConfig};
use serial_test::serial;
use std::sync::OnceLock;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    node: DeliveryNode,
}

fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("payload.bin"), b"metrics payload").unwrap();

        let mut config = NodeConfig::default();
        config.node.data_dir = dir.path().to_path_buf();
        config.node.registry_count = 4;
        config.delivery.payload_path = Some("payload.bin".into());
        config.metrics.enabled = true;

        let node = DeliveryNode::new(config).expect("Failed to create node");
        Fixture { _dir: dir, node }
    })
}

#[tokio::test]
#[serial]
async fn test_round_metrics_are_exposed() {
    let node = &fixture().node;
    let before = node.orchestrator().rounds();
    let summary = node.tick().await.unwrap();
    assert_eq!(summary.round, before + 1);

    let text = render_metrics();
    assert!(text.contains("relaygate_reputation_rounds_total"));
    assert!(text.contains("relaygate_reputation_safe_nodes"));
    assert!(text.contains("relaygate_reputation_score{node_id="));

    let recipient = summary.recipient.unwrap();
    assert!(text.contains(recipient.as_str()));
}

#[tokio::test]
#[serial]
async fn test_delivery_metrics_are_exposed() {
    let node = &fixture().node;
    node.tick().await.unwrap();

    let text = render_metrics();
    assert!(text.contains("relaygate_deliveries_total"));
    assert!(text.contains("relaygate_envelope_size_bytes"));
    assert!(text.contains("relaygate_verifications_total"));
}

#[test]
#[serial]
fn test_second_registration_fails() {
    let _ = fixture();
    let dir = TempDir::new().unwrap();
    let mut config = NodeConfig::default();
    config.node.data_dir = dir.path().to_path_buf();
    config.metrics.enabled = true;

    assert!(DeliveryNode::new(config).is_err());
}
