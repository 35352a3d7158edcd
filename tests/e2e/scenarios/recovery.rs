use crate::harness::{Assertion, Scenario};
use nodestore_core::{Node, NodeStoreError};

/// Deleted indexes are re-derived from the node records
#[test]
fn test_rebuild_after_index_loss() {
    Scenario::new("rebuild_after_index_loss")
        .node("/b")
        .node("/a")
        .reference("s", "/b")
        .weak_reference("w", "/b")
        .node("/a/c")
        .reference("s", "/b")
        .wipe_indexes()
        .reopen()
        .assert(Assertion::referrers("/b", &[]))
        .rebuild()
        .assert(Assertion::uuid_resolves("/a"))
        .assert(Assertion::uuid_resolves("/a/c"))
        .assert(Assertion::referrers("/b", &["/a", "/a/c"]))
        .assert(Assertion::weak_referrers("/b", &["/a"]))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Writes after a rebuild keep the indexes consistent
#[test]
fn test_rebuild_then_continue() {
    Scenario::new("rebuild_then_continue")
        .node("/b")
        .node("/a")
        .reference("ref", "/b")
        .rebuild()
        .rebuild()
        .assert(Assertion::referrer_entries("/b", Some("ref"), false, 1))
        .remove("/a", false)
        .assert(Assertion::referrers("/b", &[]))
        .assert(Assertion::uuid_unindexed("/a"))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// A corrupt record is reported by verify and skipped by rebuild
#[test]
fn test_corrupt_record_detected() {
    let store = Scenario::new("corrupt_record_setup")
        .node("/a")
        .run()
        .unwrap();
    store
        .write_file("/workspaces/default/a/node.json", b"not json")
        .unwrap();

    let nodes = store.open().unwrap();
    let err = nodes.read_node("default", "/a").unwrap_err();
    assert!(matches!(err, NodeStoreError::CorruptRecord { .. }));
    assert!(err.recovery_suggestion().unwrap().contains("rebuild"));

    // Neither overwrite nor remove gets past a record they can't decode
    let err = nodes.write_node("default", "/a", Node::new()).unwrap_err();
    assert!(matches!(err, NodeStoreError::CorruptRecord { .. }));
    let err = nodes.remove("default", "/a", true).unwrap_err();
    assert!(matches!(err, NodeStoreError::CorruptRecord { .. }));

    let report = nodes.verify().unwrap();
    assert_eq!(report.corrupt_records, vec!["/workspaces/default/a/node.json"]);

    let rebuilt = nodes.rebuild_indexes().unwrap();
    assert_eq!(rebuilt.corrupt_records.len(), 1);
    assert_eq!(rebuilt.nodes_indexed, 1);

    store.remove_file("/workspaces/default/a/node.json").unwrap();
    nodes.rebuild_indexes().unwrap();
    assert!(!nodes.verify().unwrap().has_issues());
    nodes.write_node("default", "/a", Node::new()).unwrap();
    assert!(!nodes.verify().unwrap().has_issues());
}
