//! Node store: placement, serialization and index maintenance for nodes.

use crate::backing::{BackingStore, FsBackingStore, Listing};
use crate::config::Config;
use crate::error::{NodeStoreError, Result};
use crate::index::{IndexManager, IndexNamespace, NodeLocation};
use crate::node::{
    JsonNodeSerializer, Node, NodeRecord, NodeSerializer, PropertyType, PRIMARY_TYPE_PROPERTY,
    UUID_PROPERTY,
};
use crate::path::{child_path, validate_workspace, PathResolver, WORKSPACES_ROOT};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Primary type of every workspace root node.
pub const ROOT_NODE_TYPE: &str = "rep:root";

/// Report from an index rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Number of workspaces scanned.
    pub workspaces: usize,
    /// Number of node records indexed.
    pub nodes_indexed: usize,
    /// Number of referrer entries written (strong and weak).
    pub references_indexed: usize,
    /// Physical paths of records skipped because they couldn't be decoded.
    pub corrupt_records: Vec<String>,
}

/// A node record found while walking a subtree.
pub(crate) struct WalkedNode {
    pub location: NodeLocation,
    pub record_path: String,
    pub record: Result<NodeRecord>,
}

/// Public surface for reading and writing nodes.
///
/// Every call goes straight to the backing store; nothing is cached.
///
/// # Concurrency
///
/// Operations are synchronous sequences of backing store calls with no
/// locking. Callers must ensure that at most one writer touches a given
/// node, and a given reference target, at a time.
///
/// # Examples
///
/// ```
/// use nodestore_core::{MemoryBackingStore, Node, NodeStore, PropertyType};
/// use std::sync::Arc;
///
/// let store = NodeStore::new(Arc::new(MemoryBackingStore::new()));
/// store.workspace_init("default").unwrap();
///
/// let target = store
///     .write_node("default", "/target", Node::new())
///     .unwrap();
/// store
///     .write_node(
///         "default",
///         "/source",
///         Node::new().with_property("ref", target.as_str(), PropertyType::Reference),
///     )
///     .unwrap();
///
/// let referrers = store.read_node_referrers("default", "/target", false).unwrap();
/// assert_eq!(referrers[0].path, "/source");
/// ```
pub struct NodeStore<S: BackingStore = FsBackingStore> {
    store: Arc<S>,
    index: IndexManager<S>,
    resolver: PathResolver,
    serializer: Box<dyn NodeSerializer>,
}

impl NodeStore<FsBackingStore> {
    /// Opens a filesystem node store rooted at `root`, honoring
    /// `<root>/nodestore.toml` when present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let config = Config::load(root)?;
        let store = FsBackingStore::with_config(root, &config.storage);
        Ok(Self::new(Arc::new(store))
            .with_resolver(PathResolver::new(&config.storage.record_extension)))
    }
}

impl<S: BackingStore> NodeStore<S> {
    /// Creates a node store over `store` with JSON records named `node.json`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            index: IndexManager::new(Arc::clone(&store)),
            store,
            resolver: PathResolver::default(),
            serializer: Box::new(JsonNodeSerializer),
        }
    }

    /// Replaces the path resolver.
    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the record serializer.
    pub fn with_serializer(mut self, serializer: impl NodeSerializer + 'static) -> Self {
        self.serializer = Box::new(serializer);
        self
    }

    /// The index manager sharing this store's backing store.
    pub fn index(&self) -> &IndexManager<S> {
        &self.index
    }

    /// The underlying backing store.
    pub fn backing(&self) -> &S {
        &self.store
    }

    /// The path resolver in use.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Writes a node, creating or fully replacing the record at `path`.
    ///
    /// A missing `jcr:uuid` is filled in with the node's existing UUID, or a
    /// fresh random one for new nodes. The JCR UUID and the internal UUID are
    /// indexed at the node's location, and every `Reference` and
    /// `WeakReference` property is indexed as a referrer of its target. On
    /// overwrite the previous referrer entries are removed first.
    ///
    /// Returns the node's JCR UUID.
    ///
    /// # Errors
    ///
    /// - `WorkspaceNotFound` if the workspace hasn't been initialized.
    /// - `NodeNotFound` if the parent node doesn't exist.
    /// - `ImmutableUuid` if the node exists with a different `jcr:uuid`.
    /// - `UuidInUse` if the supplied `jcr:uuid` belongs to another node.
    pub fn write_node(&self, workspace: &str, path: &str, node: Node) -> Result<String> {
        let path = self.resolver.normalize(path)?;
        self.require_workspace(workspace)?;

        if path != "/" {
            let parent = match path.rsplit_once('/') {
                Some((parent, _)) if !parent.is_empty() => parent,
                _ => "/",
            };
            if !self.node_exists(workspace, parent)? {
                return Err(NodeStoreError::NodeNotFound {
                    workspace: workspace.to_string(),
                    path: parent.to_string(),
                });
            }
        }

        self.store_node(workspace, &path, node)
    }

    /// Reads the node at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if no record exists and `CorruptRecord` if the
    /// record can't be decoded.
    pub fn read_node(&self, workspace: &str, path: &str) -> Result<Node> {
        Ok(self.read_record(workspace, path)?.node)
    }

    /// Reads the nodes identified by a set of JCR UUIDs, keyed by location.
    ///
    /// # Errors
    ///
    /// Returns `IndexEntryNotFound` for the first UUID without a `jcr-uuid`
    /// index entry.
    pub fn read_nodes_by_uuids<I, U>(&self, uuids: I) -> Result<BTreeMap<NodeLocation, Node>>
    where
        I: IntoIterator<Item = U>,
        U: AsRef<str>,
    {
        let mut nodes = BTreeMap::new();
        for uuid in uuids {
            let uuid = uuid.as_ref();
            let location = self.index.node_location_for_uuid(uuid, false)?.ok_or_else(|| {
                NodeStoreError::IndexEntryNotFound {
                    namespace: IndexNamespace::JcrUuid.dir_name(),
                    key: uuid.to_string(),
                }
            })?;
            let node = self.read_node(&location.workspace, &location.path)?;
            nodes.insert(location, node);
        }
        Ok(nodes)
    }

    /// Locations of the nodes holding a strong (or weak) reference to the
    /// node at `path`, in the order the references were indexed.
    ///
    /// A node referencing through several properties is listed once.
    /// Referrer entries whose internal UUID no longer resolves are skipped.
    pub fn read_node_referrers(&self, workspace: &str, path: &str, weak: bool) -> Result<Vec<NodeLocation>> {
        let record = self.read_record(workspace, path)?;
        let uuid = record.node.uuid().unwrap_or_default();

        let mut locations: Vec<NodeLocation> = Vec::new();
        for entry in self.index.referring_properties(uuid, None, weak)? {
            match self.index.node_location_for_uuid(&entry.referrer, true)? {
                Some(location) => {
                    if !locations.contains(&location) {
                        locations.push(location);
                    }
                }
                None => warn!(
                    target_uuid = uuid,
                    %entry,
                    "referrer entry points at an unindexed node, skipping"
                ),
            }
        }
        Ok(locations)
    }

    /// Removes the node at `path`, and its subtree when `recursive`.
    ///
    /// Every removed node is deindexed in both directions: its UUIDs (which
    /// drops the referrer lists targeting it) and the referrer entries its
    /// own reference properties created.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` for the root node; use `workspace_remove`.
    /// - `NodeNotFound` if no node exists at `path`.
    /// - `NodeHasChildren` if the node has children and `recursive` is false.
    /// - `CorruptRecord` if a record in the subtree can't be decoded; nothing
    ///   is removed in that case.
    pub fn remove(&self, workspace: &str, path: &str, recursive: bool) -> Result<()> {
        let path = self.resolver.normalize(path)?;
        if path == "/" {
            return Err(NodeStoreError::InvalidPath {
                path,
                reason: "the root node can only be removed with its workspace".to_string(),
            });
        }
        if !self.node_exists(workspace, &path)? {
            return Err(NodeStoreError::NodeNotFound {
                workspace: workspace.to_string(),
                path,
            });
        }

        let dir = self.resolver.node_dir(workspace, &path)?;
        if !recursive && !self.store.list(&dir)?.dirs.is_empty() {
            return Err(NodeStoreError::NodeHasChildren {
                workspace: workspace.to_string(),
                path,
            });
        }

        self.remove_subtree(workspace, &path, &dir)
    }

    /// Checks whether a node record exists at `path`.
    pub fn node_exists(&self, workspace: &str, path: &str) -> Result<bool> {
        self.store.exists(&self.resolver.resolve(workspace, path)?)
    }

    /// Lists the entries of a node's directory: the record file among the
    /// files and one directory per child node.
    pub fn ls(&self, workspace: &str, path: &str) -> Result<Listing> {
        self.store.list(&self.resolver.node_dir(workspace, path)?)
    }

    /// Creates a workspace holding only a `rep:root` root node.
    ///
    /// Returns the root node's JCR UUID.
    pub fn workspace_init(&self, name: &str) -> Result<String> {
        validate_workspace(name)?;
        if self.workspace_exists(name)? {
            return Err(NodeStoreError::WorkspaceExists(name.to_string()));
        }

        info!(workspace = name, "initializing workspace");
        let root = Node::new().with_property(PRIMARY_TYPE_PROPERTY, ROOT_NODE_TYPE, PropertyType::Name);
        self.store_node(name, "/", root)
    }

    /// Checks whether a workspace exists.
    pub fn workspace_exists(&self, name: &str) -> Result<bool> {
        self.store.exists(&self.resolver.workspace_dir(name)?)
    }

    /// Removes a workspace and every node in it, deindexing each node.
    pub fn workspace_remove(&self, name: &str) -> Result<()> {
        self.require_workspace(name)?;
        info!(workspace = name, "removing workspace");
        let dir = self.resolver.workspace_dir(name)?;
        self.remove_subtree(name, "/", &dir)
    }

    /// Names of all workspaces, sorted.
    pub fn workspace_list(&self) -> Result<Vec<String>> {
        Ok(self.store.list(WORKSPACES_ROOT)?.dirs)
    }

    /// Drops all indexes and re-derives them from the node records of every
    /// workspace.
    ///
    /// Referrer lists are only rebuilt for targets that exist, matching what
    /// `remove` leaves behind. Records that can't be decoded are skipped and
    /// reported.
    pub fn rebuild_indexes(&self) -> Result<RebuildReport> {
        let mut report = RebuildReport::default();
        self.index.clear()?;

        let mut records = Vec::new();
        for workspace in self.workspace_list()? {
            report.workspaces += 1;
            for walked in self.walk(&workspace, "/")? {
                match walked.record {
                    Ok(record) => {
                        self.index_uuids(&walked.location, &record)?;
                        report.nodes_indexed += 1;
                        records.push(record);
                    }
                    Err(e) => {
                        warn!(path = %walked.record_path, error = %e, "skipping corrupt record");
                        report.corrupt_records.push(walked.record_path);
                    }
                }
            }
        }

        let live: HashSet<&str> = records.iter().filter_map(|r| r.node.uuid()).collect();
        for record in &records {
            report.references_indexed += self.index_references(record, Some(&live))?;
        }

        info!(
            workspaces = report.workspaces,
            nodes = report.nodes_indexed,
            references = report.references_indexed,
            "rebuilt indexes"
        );
        Ok(report)
    }

    /// Reads the full record at `path`, internal UUID included.
    pub(crate) fn read_record(&self, workspace: &str, path: &str) -> Result<NodeRecord> {
        let record_path = self.resolver.resolve(workspace, path)?;
        let data = self.store.read_optional(&record_path)?.ok_or_else(|| {
            NodeStoreError::NodeNotFound {
                workspace: workspace.to_string(),
                path: path.to_string(),
            }
        })?;
        self.decode(&record_path, &data)
    }

    /// Every node at or below `path` in depth-first order, parents first.
    ///
    /// Directories without a record are descended into but not reported.
    pub(crate) fn walk(&self, workspace: &str, path: &str) -> Result<Vec<WalkedNode>> {
        let mut out = Vec::new();
        self.walk_into(workspace, path.to_string(), &mut out)?;
        Ok(out)
    }

    fn walk_into(&self, workspace: &str, path: String, out: &mut Vec<WalkedNode>) -> Result<()> {
        let dir = self.resolver.node_dir(workspace, &path)?;
        let listing = self.store.list(&dir)?;

        if listing.files.iter().any(|f| f == self.resolver.record_file()) {
            let record_path = format!("{}/{}", dir, self.resolver.record_file());
            let record = self
                .store
                .read(&record_path)
                .and_then(|data| self.decode(&record_path, &data));
            out.push(WalkedNode {
                location: NodeLocation::new(workspace, path.as_str()),
                record_path,
                record,
            });
        }

        for child in listing.dirs {
            self.walk_into(workspace, child_path(&path, &child), out)?;
        }
        Ok(())
    }

    fn decode(&self, record_path: &str, data: &[u8]) -> Result<NodeRecord> {
        self.serializer
            .decode(data)
            .map_err(|reason| NodeStoreError::CorruptRecord {
                path: record_path.to_string(),
                reason,
            })
    }

    fn require_workspace(&self, name: &str) -> Result<()> {
        if self.workspace_exists(name)? {
            Ok(())
        } else {
            Err(NodeStoreError::WorkspaceNotFound(name.to_string()))
        }
    }

    /// Writes a node at an already normalized path and reindexes it.
    fn store_node(&self, workspace: &str, path: &str, mut node: Node) -> Result<String> {
        let location = NodeLocation::new(workspace, path);
        let record_path = self.resolver.resolve(workspace, path)?;
        let previous = match self.store.read_optional(&record_path)? {
            Some(data) => Some(self.decode(&record_path, &data)?),
            None => None,
        };

        let requested = match node.property(UUID_PROPERTY) {
            None => None,
            Some(value) => Some(value.as_str().map(str::to_string).ok_or_else(|| {
                NodeStoreError::Serialization(format!("{} must be a string", UUID_PROPERTY))
            })?),
        };
        let existing = previous.as_ref().and_then(|r| r.node.uuid()).map(str::to_string);

        let uuid = match (requested, existing) {
            (Some(requested), Some(existing)) if requested != existing => {
                return Err(NodeStoreError::ImmutableUuid {
                    path: path.to_string(),
                    existing,
                    requested,
                });
            }
            (Some(requested), None) => {
                self.check_uuid_free(&requested, &location)?;
                requested
            }
            (_, Some(existing)) => existing,
            (None, None) => Uuid::new_v4().to_string(),
        };
        node.set_property(UUID_PROPERTY, uuid.as_str(), PropertyType::String);

        let internal_uuid = previous
            .as_ref()
            .map(|r| r.internal_uuid.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        for weak in [false, true] {
            for (property, target) in node.references(weak) {
                self.index.check_referrer(&internal_uuid, property, target)?;
            }
        }

        let record = NodeRecord {
            internal_uuid,
            node,
        };

        if let Some(previous) = &previous {
            self.deindex_references(previous)?;
        }

        debug!(%location, uuid = %uuid, "writing node");
        self.store.write(&record_path, &self.serializer.encode(&record)?)?;
        self.index_record(&location, &record)?;

        Ok(uuid)
    }

    /// Fails if `uuid` is indexed for a live node other than `location`.
    fn check_uuid_free(&self, uuid: &str, location: &NodeLocation) -> Result<()> {
        let Some(current) = self.index.node_location_for_uuid(uuid, false)? else {
            return Ok(());
        };
        if current == *location || !self.node_exists(&current.workspace, &current.path)? {
            return Ok(());
        }
        Err(NodeStoreError::UuidInUse {
            uuid: uuid.to_string(),
            location: current.to_string(),
        })
    }

    /// Indexes a record's UUIDs and references, returning the number of
    /// referrer entries written.
    fn index_record(&self, location: &NodeLocation, record: &NodeRecord) -> Result<usize> {
        self.index_uuids(location, record)?;
        self.index_references(record, None)
    }

    fn index_uuids(&self, location: &NodeLocation, record: &NodeRecord) -> Result<()> {
        let uuid = record.node.uuid().unwrap_or_default();
        self.index.index_uuid(uuid, location, false)?;
        self.index.index_uuid(&record.internal_uuid, location, true)
    }

    /// Indexes a record's references, restricted to targets in `live` when
    /// given.
    fn index_references(&self, record: &NodeRecord, live: Option<&HashSet<&str>>) -> Result<usize> {
        let mut count = 0;
        for weak in [false, true] {
            for (property, target) in record.node.references(weak) {
                if live.is_some_and(|live| !live.contains(target)) {
                    continue;
                }
                self.index
                    .index_referrer(&record.internal_uuid, property, target, weak)?;
                count += 1;
            }
        }
        Ok(count)
    }

    fn deindex_references(&self, record: &NodeRecord) -> Result<()> {
        for weak in [false, true] {
            for (property, target) in record.node.references(weak) {
                self.index
                    .deindex_referrer(&record.internal_uuid, property, target)?;
            }
        }
        Ok(())
    }

    /// Deindexes every node below `path`, then deletes `dir`.
    ///
    /// All records are decoded before anything is touched.
    fn remove_subtree(&self, workspace: &str, path: &str, dir: &str) -> Result<()> {
        let records = self
            .walk(workspace, path)?
            .into_iter()
            .map(|walked| walked.record)
            .collect::<Result<Vec<_>>>()?;

        for record in &records {
            self.deindex_references(record)?;
            self.index
                .deindex_uuid(record.node.uuid().unwrap_or_default(), false)?;
            self.index.deindex_uuid(&record.internal_uuid, true)?;
        }

        debug!(workspace, path, nodes = records.len(), "removing subtree");
        self.store.remove(dir, true)
    }
}
