//! Filesystem backing store.

use super::{segments, BackingStore, Listing};
use crate::config::StorageConfig;
use crate::error::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extension of in-flight write files, hidden from listings.
pub(crate) const TEMP_EXTENSION: &str = "tmp";

/// Backing store rooted at a directory on the local filesystem.
///
/// The logical path `/a/b` maps onto `<root>/a/b`. Writes are atomic per
/// file using temp file + rename; there is no atomicity across files.
///
/// # Examples
///
/// ```
/// use nodestore_core::{BackingStore, FsBackingStore};
/// use tempfile::TempDir;
///
/// let tmp = TempDir::new().unwrap();
/// let store = FsBackingStore::new(tmp.path());
///
/// store.write("/indexes/jcr-uuid/abc", b"default:/a").unwrap();
/// assert_eq!(store.read("/indexes/jcr-uuid/abc").unwrap(), b"default:/a");
/// ```
#[derive(Debug, Clone)]
pub struct FsBackingStore {
    root: PathBuf,
    fsync: bool,
}

impl FsBackingStore {
    /// Creates a store rooted at `root` with default storage settings.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_config(root, &StorageConfig::default())
    }

    /// Creates a store rooted at `root` using the given storage settings.
    pub fn with_config(root: impl AsRef<Path>, config: &StorageConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            fsync: config.fsync,
        }
    }

    /// Returns the root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a logical path onto the filesystem.
    fn physical(&self, path: &str) -> Result<PathBuf> {
        let mut out = self.root.clone();
        for seg in segments(path)? {
            out.push(seg);
        }
        Ok(out)
    }
}

impl BackingStore for FsBackingStore {
    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = self.physical(path)?;
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        // Atomic write: temp file + fsync + rename
        let tmp_path = path.with_extension(TEMP_EXTENSION);

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(data)?;
            if self.fsync {
                file.sync_all()?;
            }
        }

        fs::rename(&tmp_path, &path)?;

        #[cfg(unix)]
        {
            if self.fsync {
                if let Ok(dir_file) = File::open(dir) {
                    let _ = dir_file.sync_all();
                }
            }
        }

        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.physical(path)?)?)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.physical(path)?.exists())
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<()> {
        let path = self.physical(path)?;

        if path.is_dir() {
            if recursive {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_dir(&path)?;
            }
        } else if path.exists() {
            fs::remove_file(&path)?;
        }

        Ok(())
    }

    fn list(&self, path: &str) -> Result<Listing> {
        let dir = self.physical(path)?;
        let mut listing = Listing::default();

        if !dir.is_dir() {
            return Ok(listing);
        }

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let entry_path = entry.path();
            let Some(name) = entry_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if entry_path.is_dir() {
                listing.dirs.push(name.to_string());
            } else {
                // Skip in-flight temp files
                if entry_path.extension().and_then(|s| s.to_str()) == Some(TEMP_EXTENSION) {
                    continue;
                }
                listing.files.push(name.to_string());
            }
        }

        listing.files.sort();
        listing.dirs.sort();
        Ok(listing)
    }
}
