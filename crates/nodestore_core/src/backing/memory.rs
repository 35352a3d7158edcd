use super::{canonical, BackingStore, Listing};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::RwLock;

/// In-memory, BTreeMap-based backing store.
///
/// Intended for tests and embedding. Only files are stored; a directory
/// exists as long as some file lives below it.
pub struct MemoryBackingStore {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackingStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of files currently stored.
    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of every stored file path.
    pub fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for MemoryBackingStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefix shared by every file below `dir`.
fn dir_prefix(dir: &str) -> String {
    if dir == "/" {
        dir.to_string()
    } else {
        format!("{}/", dir)
    }
}

impl BackingStore for MemoryBackingStore {
    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = canonical(path)?;
        let mut map = self.files.write().expect("lock poisoned");
        map.insert(path, data.to_vec());
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = canonical(path)?;
        let map = self.files.read().expect("lock poisoned");
        map.get(&path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", path)).into()
        })
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let path = canonical(path)?;
        let prefix = dir_prefix(&path);
        let map = self.files.read().expect("lock poisoned");
        Ok(map.contains_key(&path) || map.keys().any(|k| k.starts_with(&prefix)))
    }

    fn remove(&self, path: &str, recursive: bool) -> Result<()> {
        let path = canonical(path)?;
        let prefix = dir_prefix(&path);
        let mut map = self.files.write().expect("lock poisoned");

        if map.remove(&path).is_some() {
            return Ok(());
        }

        let children: Vec<String> = map
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();

        if !children.is_empty() && !recursive {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("directory not empty: {}", path),
            )
            .into());
        }

        for key in children {
            map.remove(&key);
        }
        Ok(())
    }

    fn list(&self, path: &str) -> Result<Listing> {
        let path = canonical(path)?;
        let prefix = dir_prefix(&path);
        let map = self.files.read().expect("lock poisoned");

        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();
        for key in map.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(dir.to_string());
                }
                None => {
                    files.insert(rest.to_string());
                }
            }
        }

        Ok(Listing {
            files: files.into_iter().collect(),
            dirs: dirs.into_iter().collect(),
        })
    }
}

impl std::fmt::Debug for MemoryBackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackingStore")
            .field("file_count", &self.len())
            .finish()
    }
}
