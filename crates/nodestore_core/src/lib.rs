//! Node Store Core Library
//!
//! A filesystem-backed persistence layer for a hierarchical tree of named,
//! typed nodes, organized into workspaces, providing:
//! - One record file per node, placed by its logical path
//! - Lookup of nodes by UUID
//! - Strong and weak reference indexes traversable in both directions
//!
//! # Quick Start
//!
//! ```
//! use nodestore_core::{Node, NodeStore, PropertyType};
//! use tempfile::TempDir;
//!
//! let tmp = TempDir::new().unwrap();
//! let store = NodeStore::open(tmp.path()).unwrap();
//! store.workspace_init("default").unwrap();
//!
//! // Write a node; a jcr:uuid is assigned
//! let uuid = store
//!     .write_node("default", "/content", Node::new().with_property("title", "Hello", PropertyType::String))
//!     .unwrap();
//!
//! // Find it again by UUID
//! let nodes = store.read_nodes_by_uuids([&uuid]).unwrap();
//! assert_eq!(nodes.keys().next().unwrap().path, "/content");
//! ```
//!
//! # Persisted Layout
//!
//! ```text
//! /workspaces/<workspace>/<path...>/node.json
//! /indexes/jcr-uuid/<uuid>              <workspace>:<path>
//! /indexes/internal-uuid/<uuid>         <workspace>:<path>
//! /indexes/referrers/<target uuid>      <property>:<referrer internal uuid> per line
//! /indexes/referrers-weak/<target uuid> <property>:<referrer internal uuid> per line
//! ```
//!
//! # Concurrency
//!
//! Single writer at a time. Nothing here locks; two concurrent writers to
//! the same node or the same reference target can lose index updates.
//! Hosting code must serialize writes, e.g. with a lock per store root.

mod backing;
mod config;
mod error;
mod index;
mod node;
mod path;
mod store;
mod verify;

pub use backing::{BackingStore, FsBackingStore, Listing, MemoryBackingStore};
pub use config::{Config, StorageConfig, WorkspaceConfig, CONFIG_FILE};
pub use error::{NodeStoreError, Result};
pub use index::{IndexManager, IndexNamespace, NodeLocation, ReferrerEntry, INDEXES_ROOT};
pub use node::{
    JsonNodeSerializer, Node, NodeRecord, NodeSerializer, PropertyType, PRIMARY_TYPE_PROPERTY,
    UUID_PROPERTY,
};
pub use path::{child_path, validate_workspace, PathResolver, RECORD_STEM, WORKSPACES_ROOT};
pub use store::{NodeStore, RebuildReport, ROOT_NODE_TYPE};
pub use verify::VerifyReport;
