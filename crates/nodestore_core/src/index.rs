//! Secondary indexes over node records.
//!
//! Four namespaces live under `/indexes`, one file per key:
//!
//! | Namespace        | Key              | Content                                   |
//! |------------------|------------------|-------------------------------------------|
//! | `jcr-uuid`       | JCR UUID         | `<workspace>:<path>`                      |
//! | `internal-uuid`  | internal UUID    | `<workspace>:<path>`                      |
//! | `referrers`      | target JCR UUID  | lines of `<property>:<referrer internal>` |
//! | `referrers-weak` | target JCR UUID  | lines of `<property>:<referrer internal>` |
//!
//! Every operation is a read-modify-write against the backing store with no
//! locking. Two writers appending to the same referrer list at the same time
//! can lose an update; callers must serialize writes per node and per
//! reference target.

use crate::backing::BackingStore;
use crate::error::{NodeStoreError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Store directory holding every index namespace.
pub const INDEXES_ROOT: &str = "/indexes";

/// The closed set of index namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexNamespace {
    /// JCR UUID to node location.
    JcrUuid,
    /// Internal UUID to node location.
    InternalUuid,
    /// Target JCR UUID to strong referrers.
    Referrers,
    /// Target JCR UUID to weak referrers.
    ReferrersWeak,
}

impl IndexNamespace {
    /// Every namespace, in layout order.
    pub const ALL: [IndexNamespace; 4] = [
        Self::JcrUuid,
        Self::InternalUuid,
        Self::Referrers,
        Self::ReferrersWeak,
    ];

    /// Directory name under `/indexes`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::JcrUuid => "jcr-uuid",
            Self::InternalUuid => "internal-uuid",
            Self::Referrers => "referrers",
            Self::ReferrersWeak => "referrers-weak",
        }
    }

    /// The location namespace for JCR or internal UUIDs.
    pub fn uuid(internal: bool) -> Self {
        if internal {
            Self::InternalUuid
        } else {
            Self::JcrUuid
        }
    }

    /// The referrer namespace for strong or weak references.
    pub fn referrers(weak: bool) -> Self {
        if weak {
            Self::ReferrersWeak
        } else {
            Self::Referrers
        }
    }

    /// Store directory of this namespace.
    pub fn dir(self) -> String {
        format!("{}/{}", INDEXES_ROOT, self.dir_name())
    }
}

/// Where a node lives: workspace plus normalized logical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeLocation {
    /// Workspace name.
    pub workspace: String,
    /// Normalized logical path.
    pub path: String,
}

impl NodeLocation {
    /// Creates a location.
    pub fn new(workspace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            path: path.into(),
        }
    }

    /// Parses the `<workspace>:<path>` index form.
    fn parse(content: &str) -> Option<Self> {
        let (workspace, path) = content.split_once(':')?;
        if workspace.is_empty() || !path.starts_with('/') {
            return None;
        }
        Some(Self::new(workspace, path))
    }
}

impl fmt::Display for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workspace, self.path)
    }
}

/// One line of a referrer list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferrerEntry {
    /// Name of the referring property.
    pub property: String,
    /// Internal UUID of the referring node.
    pub referrer: String,
}

impl ReferrerEntry {
    /// Creates an entry.
    pub fn new(property: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            referrer: referrer.into(),
        }
    }

    /// Parses `<property>:<referrer>`.
    ///
    /// Property names may themselves contain `:` (`jcr:content`), so the
    /// split happens at the last colon.
    fn parse(line: &str) -> Option<Self> {
        let (property, referrer) = line.rsplit_once(':')?;
        if property.is_empty() || referrer.is_empty() {
            return None;
        }
        Some(Self::new(property, referrer))
    }
}

impl fmt::Display for ReferrerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.property, self.referrer)
    }
}

/// Owner of the four index namespaces.
///
/// Holds no state besides the store handle; every lookup reads the backing
/// store.
pub struct IndexManager<S: BackingStore> {
    store: Arc<S>,
}

impl<S: BackingStore> Clone for IndexManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BackingStore> IndexManager<S> {
    /// Creates an index manager over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Maps `uuid` to `location` in the JCR or internal namespace.
    ///
    /// Overwrites any previous entry.
    pub fn index_uuid(&self, uuid: &str, location: &NodeLocation, internal: bool) -> Result<()> {
        let path = key_path(IndexNamespace::uuid(internal), uuid)?;
        debug!(uuid, %location, internal, "indexing uuid");
        self.store.write(&path, location.to_string().as_bytes())
    }

    /// Deletes the location entry for `uuid`.
    ///
    /// Deindexing a JCR UUID also drops its strong and weak referrer lists,
    /// since the node can no longer be a reference target.
    pub fn deindex_uuid(&self, uuid: &str, internal: bool) -> Result<()> {
        debug!(uuid, internal, "deindexing uuid");
        self.store
            .remove(&key_path(IndexNamespace::uuid(internal), uuid)?, false)?;

        if !internal {
            for ns in [IndexNamespace::Referrers, IndexNamespace::ReferrersWeak] {
                self.store.remove(&key_path(ns, uuid)?, false)?;
            }
        }
        Ok(())
    }

    /// Looks up where the node with `uuid` lives.
    ///
    /// Returns `Ok(None)` when the UUID isn't indexed.
    pub fn node_location_for_uuid(&self, uuid: &str, internal: bool) -> Result<Option<NodeLocation>> {
        let path = key_path(IndexNamespace::uuid(internal), uuid)?;
        let Some(data) = self.store.read_optional(&path)? else {
            return Ok(None);
        };

        let content = String::from_utf8_lossy(&data);
        NodeLocation::parse(&content)
            .map(Some)
            .ok_or_else(|| NodeStoreError::InvalidIndexEntry {
                path,
                reason: format!("expected <workspace>:<path>, got '{}'", content.trim_end()),
            })
    }

    /// Records that property `property` of node `referrer` (internal UUID)
    /// references `target` (JCR UUID).
    ///
    /// Adding a pair that is already listed is a no-op.
    pub fn index_referrer(&self, referrer: &str, property: &str, target: &str, weak: bool) -> Result<()> {
        check_entry_parts(referrer, property)?;

        let ns = IndexNamespace::referrers(weak);
        let entry = ReferrerEntry::new(property, referrer);
        let mut entries = self.read_list(ns, target)?;

        if entries.contains(&entry) {
            debug!(%entry, target_uuid = target, weak, "referrer already indexed");
            return Ok(());
        }

        debug!(%entry, target_uuid = target, weak, "indexing referrer");
        entries.push(entry);
        self.write_list(ns, target, &entries)
    }

    /// Removes the `property:referrer` pair from both referrer lists of
    /// `target`, leaving every other entry untouched.
    pub fn deindex_referrer(&self, referrer: &str, property: &str, target: &str) -> Result<()> {
        let entry = ReferrerEntry::new(property, referrer);

        for weak in [false, true] {
            let ns = IndexNamespace::referrers(weak);
            let mut entries = self.read_list(ns, target)?;
            let before = entries.len();
            entries.retain(|e| *e != entry);

            if entries.len() != before {
                debug!(%entry, target_uuid = target, weak, "deindexing referrer");
                self.write_list(ns, target, &entries)?;
            }
        }
        Ok(())
    }

    /// Lists the properties referencing `target`, in insertion order.
    ///
    /// `property_filter` keeps only entries whose property name matches
    /// exactly. A target nobody references yields an empty list.
    pub fn referring_properties(
        &self,
        target: &str,
        property_filter: Option<&str>,
        weak: bool,
    ) -> Result<Vec<ReferrerEntry>> {
        let mut entries = self.read_list(IndexNamespace::referrers(weak), target)?;
        if let Some(name) = property_filter {
            entries.retain(|e| e.property == name);
        }
        Ok(entries)
    }

    /// Checks that a referrer entry for `target` could be indexed, without
    /// touching the store.
    pub(crate) fn check_referrer(&self, referrer: &str, property: &str, target: &str) -> Result<()> {
        check_entry_parts(referrer, property)?;
        key_path(IndexNamespace::Referrers, target).map(|_| ())
    }

    /// Every key present in a namespace, sorted.
    pub fn keys(&self, ns: IndexNamespace) -> Result<Vec<String>> {
        Ok(self.store.list(&ns.dir())?.files)
    }

    /// Drops every index namespace.
    pub fn clear(&self) -> Result<()> {
        debug!("clearing all indexes");
        self.store.remove(INDEXES_ROOT, true)
    }

    fn read_list(&self, ns: IndexNamespace, key: &str) -> Result<Vec<ReferrerEntry>> {
        let path = key_path(ns, key)?;
        let Some(data) = self.store.read_optional(&path)? else {
            return Ok(Vec::new());
        };

        let content = String::from_utf8_lossy(&data);
        content
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                ReferrerEntry::parse(line).ok_or_else(|| NodeStoreError::InvalidIndexEntry {
                    path: path.clone(),
                    reason: format!("expected <property>:<referrer>, got '{}'", line),
                })
            })
            .collect()
    }

    /// Rewrites a list; an empty list removes the file.
    fn write_list(&self, ns: IndexNamespace, key: &str, entries: &[ReferrerEntry]) -> Result<()> {
        let path = key_path(ns, key)?;
        if entries.is_empty() {
            return self.store.remove(&path, false);
        }

        let content = entries
            .iter()
            .map(ReferrerEntry::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.store.write(&path, content.as_bytes())
    }
}

/// Store path of `key` in `ns`, rejecting keys that aren't a single segment.
fn key_path(ns: IndexNamespace, key: &str) -> Result<String> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\n']) {
        return Err(NodeStoreError::InvalidPath {
            path: key.to_string(),
            reason: format!("not a valid {} index key", ns.dir_name()),
        });
    }
    Ok(format!("{}/{}", ns.dir(), key))
}

fn check_entry_parts(referrer: &str, property: &str) -> Result<()> {
    if referrer.is_empty() || referrer.contains([':', '\n']) || property.is_empty() || property.contains('\n') {
        return Err(NodeStoreError::InvalidIndexEntry {
            path: format!("{}:{}", property, referrer),
            reason: "referrer entries need a non-empty single-line property and a colon-free referrer"
                .to_string(),
        });
    }
    Ok(())
}
