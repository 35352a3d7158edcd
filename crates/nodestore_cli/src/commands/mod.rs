//! CLI commands.

pub mod maintenance;
pub mod node;
pub mod query;
pub mod workspace;

use anyhow::{anyhow, Context as _, Result};
use fs2::FileExt;
use nodestore_core::{Config, NodeStore, NodeStoreError};
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use tracing::debug;

/// Name of the advisory lock file inside the store root.
const LOCK_FILE: &str = ".lock";

/// Shared state for every command: the store root and workspace selection.
pub struct Context {
    root: PathBuf,
    workspace: String,
}

impl Context {
    /// Resolves the workspace from the flag or the store configuration.
    pub fn new(root: PathBuf, workspace: Option<String>) -> Result<Self> {
        let workspace = match workspace {
            Some(name) => name,
            None => {
                Config::load(&root)
                    .context("Failed to load nodestore.toml")?
                    .workspace
                    .default
            }
        };
        Ok(Self { root, workspace })
    }

    /// Workspace selected for this invocation.
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Opens the node store at the root.
    pub fn open(&self) -> Result<NodeStore> {
        debug!(root = %self.root.display(), workspace = %self.workspace, "opening node store");
        NodeStore::open(&self.root)
            .with_context(|| format!("Failed to open node store at {}", self.root.display()))
    }

    /// Takes the exclusive writer lock for the store root.
    ///
    /// The node store itself doesn't lock; every mutating command holds this
    /// until the returned file is dropped.
    pub fn lock(&self) -> Result<File> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.root.join(LOCK_FILE))
            .context("Failed to open lock file")?;
        file.lock_exclusive()
            .context("Failed to acquire the store lock")?;
        Ok(file)
    }
}

/// Appends the store's recovery hint to an error, when it has one.
pub fn explain(err: NodeStoreError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n  hint: {}", err, hint),
        None => anyhow::Error::new(err),
    }
}
