//! Byte-oriented backing store keyed by slash-delimited logical paths.
//!
//! The rest of the crate treats a backing store as a black box: node
//! records and index files are written, read, listed and removed through
//! this trait only, and nothing is cached above it.

mod fs;
mod memory;

pub use self::fs::FsBackingStore;
pub(crate) use self::fs::TEMP_EXTENSION;
pub use self::memory::MemoryBackingStore;

use crate::error::{NodeStoreError, Result};

/// Entries directly below a logical directory.
///
/// Both lists are sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Names of regular entries.
    pub files: Vec<String>,
    /// Names of sub-directories.
    pub dirs: Vec<String>,
}

impl Listing {
    /// Returns true if the directory has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// Key to bytes store addressed by POSIX-style absolute paths.
///
/// Implementations must satisfy:
/// - `write` replaces the full content of a path, creating parents as needed.
/// - `read` of a missing path fails with an I/O `NotFound` error.
/// - `remove` of a missing path succeeds without doing anything.
/// - `list` of a missing directory returns an empty listing.
/// - Errors are propagated, never swallowed.
pub trait BackingStore: Send + Sync {
    /// Write `data` at `path`, replacing any previous content.
    fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read the full content at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Check whether a file or directory exists at `path`.
    fn exists(&self, path: &str) -> Result<bool>;

    /// Remove the file or directory at `path`.
    ///
    /// Removing a non-empty directory without `recursive` is an error.
    fn remove(&self, path: &str, recursive: bool) -> Result<()>;

    /// List the entries directly below `path`.
    fn list(&self, path: &str) -> Result<Listing>;

    /// Read `path`, mapping a missing file to `None`.
    fn read_optional(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Splits an absolute logical path into its segments.
///
/// `/` yields no segments. Empty, `.` and `..` segments are rejected, as is
/// any path that does not start with `/`.
pub(crate) fn segments(path: &str) -> Result<Vec<&str>> {
    let invalid = |reason: &str| NodeStoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| invalid("store paths must be absolute"))?;

    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for seg in rest.split('/') {
        match seg {
            "" => return Err(invalid("empty path segment")),
            "." | ".." => return Err(invalid("relative path segment")),
            s => out.push(s),
        }
    }
    Ok(out)
}

/// Canonical form of a logical store path (`/` for the root).
pub(crate) fn canonical(path: &str) -> Result<String> {
    let segs = segments(path)?;
    Ok(format!("/{}", segs.join("/")))
}
