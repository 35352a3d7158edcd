use crate::harness::{Assertion, Scenario, TestStore};
use nodestore_core::Config;

/// Records and indexes land where the persisted layout says
#[test]
fn test_persisted_layout() {
    let store = Scenario::new("persisted_layout")
        .node("/b")
        .node("/a")
        .reference("ref", "/b")
        .node("/a/child")
        .assert(Assertion::file_exists("/workspaces/default/node.json"))
        .assert(Assertion::file_exists("/workspaces/default/a/node.json"))
        .assert(Assertion::file_exists("/workspaces/default/a/child/node.json"))
        .assert(Assertion::file_exists("/indexes/jcr-uuid"))
        .assert(Assertion::file_exists("/indexes/internal-uuid"))
        .assert(Assertion::file_exists("/indexes/referrers"))
        .assert(Assertion::file_missing("/indexes/referrers-weak"))
        .run()
        .unwrap();

    let nodes = store.open().unwrap();
    let b = nodes.read_node("default", "/b").unwrap();
    let b_uuid = b.uuid().unwrap();

    let location = store.read_file(&format!("/indexes/jcr-uuid/{}", b_uuid)).unwrap();
    assert_eq!(location.trim_end(), "default:/b");

    let list = store.read_file(&format!("/indexes/referrers/{}", b_uuid)).unwrap();
    let lines: Vec<&str> = list.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("ref:"));

    let record: serde_json::Value =
        serde_json::from_str(&store.read_file("/workspaces/default/b/node.json").unwrap()).unwrap();
    assert!(record.get("internal_uuid").is_some());
}

/// A configured record extension changes the record file name
#[test]
fn test_configured_record_extension() {
    let mut config = Config::default();
    config.storage.record_extension = "rec".to_string();
    let store = TestStore::with_config(&config).unwrap();

    Scenario::new("configured_record_extension")
        .with_store(store)
        .node("/a")
        .assert(Assertion::file_exists("/workspaces/default/a/node.rec"))
        .assert(Assertion::file_missing("/workspaces/default/a/node.json"))
        .assert(Assertion::uuid_resolves("/a"))
        .reopen()
        .assert(Assertion::node_exists("/a"))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}
