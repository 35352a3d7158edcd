use crate::harness::{Assertion, Scenario, TestStore};
use nodestore_core::NodeStoreError;

/// Removing a referrer clears the entries its properties created
#[test]
fn test_remove_referrer_cleans_target_lists() {
    Scenario::new("remove_referrer_cleans_target_lists")
        .node("/b")
        .node("/a")
        .reference("s", "/b")
        .weak_reference("w", "/b")
        .remove("/a", false)
        .assert(Assertion::node_missing("/a"))
        .assert(Assertion::uuid_unindexed("/a"))
        .assert(Assertion::referrers("/b", &[]))
        .assert(Assertion::weak_referrers("/b", &[]))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Removing a target drops its UUIDs and the referrer lists keyed by it
#[test]
fn test_remove_target_drops_its_lists() {
    Scenario::new("remove_target_drops_its_lists")
        .node("/b")
        .node("/a")
        .reference("ref", "/b")
        .remove("/b", false)
        .assert(Assertion::node_missing("/b"))
        .assert(Assertion::uuid_unindexed("/b"))
        .assert(Assertion::node_exists("/a"))
        .assert(Assertion::uuid_resolves("/a"))
        .assert(Assertion::Consistent)
        .rebuild()
        .assert(Assertion::uuid_unindexed("/b"))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// A recursive remove deindexes every node of the subtree
#[test]
fn test_recursive_remove() {
    Scenario::new("recursive_remove")
        .node("/keep")
        .node("/a")
        .reference("ref", "/keep")
        .node("/a/b")
        .weak_reference("w", "/keep")
        .node("/a/b/c")
        .remove("/a", true)
        .assert(Assertion::node_missing("/a"))
        .assert(Assertion::node_missing("/a/b/c"))
        .assert(Assertion::uuid_unindexed("/a"))
        .assert(Assertion::uuid_unindexed("/a/b"))
        .assert(Assertion::uuid_unindexed("/a/b/c"))
        .assert(Assertion::referrers("/keep", &[]))
        .assert(Assertion::weak_referrers("/keep", &[]))
        .assert(Assertion::file_missing("/workspaces/default/a"))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// A node removed and written again gets a fresh identity
#[test]
fn test_recreate_after_remove() {
    Scenario::new("recreate_after_remove")
        .node("/a")
        .remove("/a", false)
        .node("/a")
        .assert(Assertion::uuid_resolves("/a"))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

#[test]
fn test_non_recursive_remove_with_children_fails() {
    let store = Scenario::new("non_recursive_remove_setup")
        .node("/a")
        .node("/a/b")
        .run()
        .unwrap();

    let nodes = store.open().unwrap();
    let err = nodes.remove("default", "/a", false).unwrap_err();
    assert!(matches!(err, NodeStoreError::NodeHasChildren { .. }));
    assert!(nodes.node_exists("default", "/a").unwrap());
    assert!(nodes.node_exists("default", "/a/b").unwrap());
}

#[test]
fn test_remove_missing_node_fails() {
    let store = TestStore::empty().unwrap();
    let nodes = store.open().unwrap();
    nodes.workspace_init("default").unwrap();

    let err = nodes.remove("default", "/nothing", true).unwrap_err();
    assert!(matches!(err, NodeStoreError::NodeNotFound { .. }));

    let err = nodes.remove("default", "/", true).unwrap_err();
    assert!(matches!(err, NodeStoreError::InvalidPath { .. }));
}
