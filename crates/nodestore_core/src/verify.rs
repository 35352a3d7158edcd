//! Read-only consistency check between node records and the indexes.

use crate::backing::BackingStore;
use crate::error::Result;
use crate::index::{IndexNamespace, NodeLocation, ReferrerEntry};
use crate::node::NodeRecord;
use crate::store::NodeStore;
use std::collections::HashMap;

/// Report from a consistency check.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of node records checked.
    pub nodes_checked: usize,

    /// Number of index entries checked.
    pub entries_checked: usize,

    /// Physical paths of records that couldn't be decoded.
    pub corrupt_records: Vec<String>,

    /// Index entries a record implies but the index lacks.
    pub missing_entries: Vec<String>,

    /// Index entries not backed by any record.
    pub dangling_entries: Vec<String>,
}

impl VerifyReport {
    /// Returns true if any issues were found.
    pub fn has_issues(&self) -> bool {
        !self.corrupt_records.is_empty()
            || !self.missing_entries.is_empty()
            || !self.dangling_entries.is_empty()
    }

    /// Returns a summary message.
    pub fn summary(&self) -> String {
        if !self.has_issues() {
            "Store is consistent. No issues found.".to_string()
        } else {
            let mut issues = Vec::new();
            if !self.corrupt_records.is_empty() {
                issues.push(format!("{} corrupt records", self.corrupt_records.len()));
            }
            if !self.missing_entries.is_empty() {
                issues.push(format!("{} missing index entries", self.missing_entries.len()));
            }
            if !self.dangling_entries.is_empty() {
                issues.push(format!("{} dangling index entries", self.dangling_entries.len()));
            }
            format!("Store has issues: {}", issues.join(", "))
        }
    }
}

impl<S: BackingStore> NodeStore<S> {
    /// Checks that the indexes match the node records exactly.
    ///
    /// Every record must have its JCR and internal UUID indexed at its
    /// location and each of its references to an existing node listed under
    /// the target; every index entry must be backed by such a record.
    /// References to missing nodes need no entry, since removing a node
    /// drops the lists keyed by it. Nothing is modified.
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();

        let mut walked_records: Vec<(NodeLocation, NodeRecord)> = Vec::new();
        for workspace in self.workspace_list()? {
            for walked in self.walk(&workspace, "/")? {
                match walked.record {
                    Ok(record) => walked_records.push((walked.location, record)),
                    Err(_) => report.corrupt_records.push(walked.record_path),
                }
            }
        }

        let mut by_jcr: HashMap<String, NodeLocation> = HashMap::new();
        let mut by_location_internal: HashMap<String, NodeLocation> = HashMap::new();
        for (location, record) in &walked_records {
            by_jcr.insert(record.node.uuid().unwrap_or_default().to_string(), location.clone());
            by_location_internal.insert(record.internal_uuid.clone(), location.clone());
        }

        for (location, record) in &walked_records {
            report.nodes_checked += 1;
            self.check_record(location, record, &by_jcr, &mut report)?;
        }

        let by_internal: HashMap<&str, &NodeRecord> = walked_records
            .iter()
            .map(|(_, record)| (record.internal_uuid.as_str(), record))
            .collect();

        for (ns, live) in [
            (IndexNamespace::JcrUuid, &by_jcr),
            (IndexNamespace::InternalUuid, &by_location_internal),
        ] {
            for key in self.index().keys(ns)? {
                report.entries_checked += 1;
                let location = self.index().node_location_for_uuid(&key, ns == IndexNamespace::InternalUuid)?;
                if location.as_ref() != live.get(&key) {
                    report.dangling_entries.push(format!("{}/{}", ns.dir_name(), key));
                }
            }
        }

        for weak in [false, true] {
            let ns = IndexNamespace::referrers(weak);
            for target in self.index().keys(ns)? {
                for entry in self.index().referring_properties(&target, None, weak)? {
                    report.entries_checked += 1;
                    let backed = by_internal.get(entry.referrer.as_str()).is_some_and(|record| {
                        record
                            .node
                            .references(weak)
                            .contains(&(entry.property.as_str(), target.as_str()))
                    });
                    if !backed {
                        report
                            .dangling_entries
                            .push(format!("{}/{} {}", ns.dir_name(), target, entry));
                    }
                }
            }
        }

        Ok(report)
    }

    fn check_record(
        &self,
        location: &NodeLocation,
        record: &NodeRecord,
        live: &HashMap<String, NodeLocation>,
        report: &mut VerifyReport,
    ) -> Result<()> {
        let uuid = record.node.uuid().unwrap_or_default();
        for (key, internal) in [(uuid, false), (record.internal_uuid.as_str(), true)] {
            if self.index().node_location_for_uuid(key, internal)?.as_ref() != Some(location) {
                report.missing_entries.push(format!(
                    "{}/{} -> {}",
                    IndexNamespace::uuid(internal).dir_name(),
                    key,
                    location
                ));
            }
        }

        for weak in [false, true] {
            for (property, target) in record.node.references(weak) {
                if !live.contains_key(target) {
                    continue;
                }
                let expected = ReferrerEntry::new(property, record.internal_uuid.as_str());
                let listed = self
                    .index()
                    .referring_properties(target, Some(property), weak)?;
                if !listed.contains(&expected) {
                    report.missing_entries.push(format!(
                        "{}/{} {}",
                        IndexNamespace::referrers(weak).dir_name(),
                        target,
                        expected
                    ));
                }
            }
        }
        Ok(())
    }
}
