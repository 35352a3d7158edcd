use crate::harness::{Assertion, Scenario};

/// A strong reference is traversable from the target back to the source
#[test]
fn test_strong_reference_symmetry() {
    Scenario::new("strong_reference_symmetry")
        .node("/b")
        .node("/a")
        .reference("ref", "/b")
        .assert(Assertion::referrers("/b", &["/a"]))
        .assert(Assertion::referrer_entries("/b", Some("ref"), false, 1))
        .assert(Assertion::weak_referrers("/b", &[]))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Weak and strong referrers are kept in separate lists
#[test]
fn test_weak_and_strong_are_separate() {
    Scenario::new("weak_and_strong_are_separate")
        .node("/b")
        .node("/a")
        .weak_reference("w", "/b")
        .node("/c")
        .reference("s", "/b")
        .assert(Assertion::referrers("/b", &["/c"]))
        .assert(Assertion::weak_referrers("/b", &["/a"]))
        .assert(Assertion::referrer_entries("/b", None, true, 1))
        .assert(Assertion::referrer_entries("/b", None, false, 1))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Several referrers are reported in the order they were indexed
#[test]
fn test_multiple_referrers_in_order() {
    Scenario::new("multiple_referrers_in_order")
        .node("/target")
        .node("/one")
        .reference("ref", "/target")
        .node("/two")
        .reference("ref", "/target")
        .node("/three")
        .reference("other", "/target")
        .assert(Assertion::referrers("/target", &["/one", "/two", "/three"]))
        .assert(Assertion::referrer_entries("/target", Some("ref"), false, 2))
        .assert(Assertion::referrer_entries("/target", Some("other"), false, 1))
        .run()
        .unwrap();
}

/// A node referencing the same target through two properties is listed once
#[test]
fn test_referrer_listed_once_per_node() {
    Scenario::new("referrer_listed_once_per_node")
        .node("/b")
        .node("/a")
        .reference("first", "/b")
        .reference("second", "/b")
        .assert(Assertion::referrers("/b", &["/a"]))
        .assert(Assertion::referrer_entries("/b", None, false, 2))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Each value of a multi-valued reference is indexed
#[test]
fn test_multi_valued_reference() {
    Scenario::new("multi_valued_reference")
        .node("/x")
        .node("/y")
        .node("/a")
        .references("targets", &["/x", "/y"])
        .assert(Assertion::referrers("/x", &["/a"]))
        .assert(Assertion::referrers("/y", &["/a"]))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Rewriting a node with the same references leaves one entry per reference
#[test]
fn test_idempotent_overwrite() {
    Scenario::new("idempotent_overwrite")
        .node("/b")
        .node("/a")
        .reference("ref", "/b")
        .node("/a")
        .reference("ref", "/b")
        .node("/a")
        .reference("ref", "/b")
        .assert(Assertion::referrer_entries("/b", Some("ref"), false, 1))
        .assert(Assertion::referrers("/b", &["/a"]))
        .assert(Assertion::uuid_stable("/a"))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Retargeting a reference moves the referrer entry to the new target
#[test]
fn test_overwrite_retargets_reference() {
    Scenario::new("overwrite_retargets_reference")
        .node("/old")
        .node("/new")
        .node("/a")
        .reference("ref", "/old")
        .node("/a")
        .reference("ref", "/new")
        .assert(Assertion::referrers("/old", &[]))
        .assert(Assertion::referrer_entries("/old", None, false, 0))
        .assert(Assertion::referrers("/new", &["/a"]))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// Dropping a reference property on overwrite drops its referrer entry
#[test]
fn test_overwrite_drops_reference() {
    Scenario::new("overwrite_drops_reference")
        .node("/b")
        .node("/a")
        .weak_reference("w", "/b")
        .node("/a")
        .text("title", "no more references")
        .assert(Assertion::weak_referrers("/b", &[]))
        .assert(Assertion::property("/a", "title", "no more references"))
        .assert(Assertion::Consistent)
        .run()
        .unwrap();
}

/// A node may reference itself
#[test]
fn test_self_reference() {
    Scenario::new("self_reference")
        .node("/a")
        .node("/a")
        .reference("me", "/a")
        .assert(Assertion::referrers("/a", &["/a"]))
        .assert(Assertion::Consistent)
        .remove("/a", false)
        .assert(Assertion::uuid_unindexed("/a"))
        .run()
        .unwrap();
}
