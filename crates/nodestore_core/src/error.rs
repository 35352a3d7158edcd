//! Error types for nodestore_core operations.

use thiserror::Error;

/// Core error type for node store operations.
#[derive(Error, Debug)]
pub enum NodeStoreError {
    /// No node record exists at the resolved location.
    #[error("node not found: {workspace}:{path}")]
    NodeNotFound {
        /// Workspace that was searched
        workspace: String,
        /// Logical node path
        path: String,
    },

    /// A UUID the caller asserted to be indexed has no index entry.
    #[error("no {namespace} index entry for {key}")]
    IndexEntryNotFound {
        /// Index namespace directory name
        namespace: &'static str,
        /// The key that was looked up
        key: String,
    },

    /// A node record could not be decoded.
    #[error("corrupt node record at {path}: {reason}")]
    CorruptRecord {
        /// Physical path of the record
        path: String,
        /// Description of the decode failure
        reason: String,
    },

    /// Logical or physical path is malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// What's wrong with it
        reason: String,
    },

    /// Workspace name is malformed.
    #[error("invalid workspace name '{0}'")]
    InvalidWorkspace(String),

    /// Workspace already exists.
    #[error("workspace already exists: {0}")]
    WorkspaceExists(String),

    /// Workspace does not exist.
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),

    /// Non-recursive removal of a node that still has children.
    #[error("node {workspace}:{path} has children; use a recursive remove")]
    NodeHasChildren {
        /// Workspace of the node
        workspace: String,
        /// Logical node path
        path: String,
    },

    /// An overwrite tried to change the JCR UUID of an existing node.
    #[error("jcr:uuid of {path} is {existing}, refusing to change it to {requested}")]
    ImmutableUuid {
        /// Logical node path
        path: String,
        /// UUID already stored for the node
        existing: String,
        /// UUID supplied by the caller
        requested: String,
    },

    /// The requested JCR UUID already identifies another node.
    #[error("jcr:uuid {uuid} is already used by {location}")]
    UuidInUse {
        /// The conflicting UUID
        uuid: String,
        /// `workspace:path` of the node holding it
        location: String,
    },

    /// An index file does not follow the persisted layout.
    #[error("invalid index entry at {path}: {reason}")]
    InvalidIndexEntry {
        /// Physical path of the index file
        path: String,
        /// Description of what's invalid
        reason: String,
    },

    /// Serialization error while encoding a node record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error (loading, parsing, invalid values).
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodeStoreError {
    /// Returns a user-friendly recovery suggestion for the error, if available.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidIndexEntry { .. } => {
                Some("Run 'nodestore rebuild' to regenerate the indexes from node records.")
            }
            Self::IndexEntryNotFound { .. } => {
                Some("The index might be stale. Run 'nodestore verify' to check.")
            }
            Self::CorruptRecord { .. } => Some(
                "The store can't overwrite or remove it. Delete the record file by hand, \
                 then run 'nodestore rebuild'.",
            ),
            Self::WorkspaceNotFound(_) => {
                Some("Create it with 'nodestore workspace init <name>'.")
            }
            Self::NodeHasChildren { .. } => Some("Pass --recursive to remove the whole subtree."),
            _ => None,
        }
    }

    /// Returns true if this error is an I/O "not found" from the backing store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Convenience Result type for nodestore_core operations.
pub type Result<T> = std::result::Result<T, NodeStoreError>;
