//! Recursive, sorted snapshot of a session root.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::vfs::error::WorkspaceError;
use crate::vfs::policy::SandboxPolicy;

/// Kind of a [`TreeNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// Read-only projection of one entry under a session root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Entry name.
    pub name: String,
    /// Root-relative path with `/` separators.
    pub path: String,
    /// Whether this is a file or a directory.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Size in bytes, files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Sorted children, directories only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// Returns true for directory nodes.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Lists the whole tree under `root`. At every level directories come
/// first, then entries in case-insensitive name order. Symlinks are
/// omitted.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn list_tree(root: &Path) -> Result<Vec<TreeNode>, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    children_of(&policy, policy.root())
}

fn children_of(policy: &SandboxPolicy, directory: &Path) -> Result<Vec<TreeNode>, WorkspaceError> {
    let mut nodes = Vec::new();
    for entry in fs::read_dir(directory).map_err(|e| WorkspaceError::io(directory, e))? {
        let entry = entry.map_err(|e| WorkspaceError::io(directory, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| WorkspaceError::io(&path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = policy.relative(&path)?;

        if file_type.is_dir() {
            nodes.push(TreeNode {
                name,
                path: relative,
                kind: NodeKind::Directory,
                size: None,
                children: Some(children_of(policy, &path)?),
            });
        } else if file_type.is_file() {
            let size = entry
                .metadata()
                .map_err(|e| WorkspaceError::io(&path, e))?
                .len();
            nodes.push(TreeNode {
                name,
                path: relative,
                kind: NodeKind::File,
                size: Some(size),
                children: None,
            });
        }
    }
    nodes.sort_by(compare_nodes);
    Ok(nodes)
}

fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}
