//! Mapping from (workspace, logical node path) to physical store paths.
//!
//! Layout:
//!
//! ```text
//! /workspaces/<workspace>/<seg>/<seg>/.../node.<ext>
//! ```

use crate::error::{NodeStoreError, Result};

/// Store directory holding one sub-directory per workspace.
pub const WORKSPACES_ROOT: &str = "/workspaces";

/// File stem of a node record.
pub const RECORD_STEM: &str = "node";

/// Pure resolver from logical node paths to physical record paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    record_file: String,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new("json")
    }
}

impl PathResolver {
    /// Creates a resolver whose record files are named `node.<extension>`.
    pub fn new(extension: &str) -> Self {
        Self {
            record_file: format!("{}.{}", RECORD_STEM, extension),
        }
    }

    /// File name of every node record.
    pub fn record_file(&self) -> &str {
        &self.record_file
    }

    /// Normalizes a logical node path to its canonical rooted form.
    ///
    /// A leading and a trailing slash are optional and `.` segments are
    /// dropped. Empty segments, `..` and segments that collide with the
    /// record file name are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodestore_core::PathResolver;
    ///
    /// let resolver = PathResolver::default();
    /// assert_eq!(resolver.normalize("a/./b/").unwrap(), "/a/b");
    /// assert_eq!(resolver.normalize("/").unwrap(), "/");
    /// assert!(resolver.normalize("/a/../b").is_err());
    /// ```
    pub fn normalize(&self, logical: &str) -> Result<String> {
        Ok(format!("/{}", self.segments(logical)?.join("/")))
    }

    /// Directory of a workspace's node tree.
    pub fn workspace_dir(&self, workspace: &str) -> Result<String> {
        validate_workspace(workspace)?;
        Ok(format!("{}/{}", WORKSPACES_ROOT, workspace))
    }

    /// Directory holding a node's record and its children.
    pub fn node_dir(&self, workspace: &str, logical: &str) -> Result<String> {
        let mut dir = self.workspace_dir(workspace)?;
        for seg in self.segments(logical)? {
            dir.push('/');
            dir.push_str(seg);
        }
        Ok(dir)
    }

    /// Physical path of a node's record file.
    ///
    /// # Examples
    ///
    /// ```
    /// use nodestore_core::PathResolver;
    ///
    /// let resolver = PathResolver::default();
    /// assert_eq!(
    ///     resolver.resolve("default", "/content/page").unwrap(),
    ///     "/workspaces/default/content/page/node.json"
    /// );
    /// ```
    pub fn resolve(&self, workspace: &str, logical: &str) -> Result<String> {
        Ok(format!(
            "{}/{}",
            self.node_dir(workspace, logical)?,
            self.record_file
        ))
    }

    fn segments<'a>(&self, logical: &'a str) -> Result<Vec<&'a str>> {
        let invalid = |reason: &str| NodeStoreError::InvalidPath {
            path: logical.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = logical.strip_prefix('/').unwrap_or(logical);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for seg in trimmed.split('/') {
            match seg {
                "" => return Err(invalid("empty path segment")),
                "." => continue,
                ".." => return Err(invalid("'..' is not allowed")),
                s if s == self.record_file => {
                    return Err(invalid("segment collides with the record file name"))
                }
                s => out.push(s),
            }
        }
        Ok(out)
    }
}

/// Appends a child name to a normalized node path.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Checks that a workspace name can be used as a single path segment and
/// inside a `workspace:path` index value.
pub fn validate_workspace(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', ':', '\n'])
    {
        return Err(NodeStoreError::InvalidWorkspace(name.to_string()));
    }
    Ok(())
}
