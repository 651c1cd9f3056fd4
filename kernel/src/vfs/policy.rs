//! Sandbox policy for file system access control.
//!
//! This module is the containment boundary of the whole kernel: every
//! caller-supplied path is turned into an absolute path under a session root
//! here, or rejected, before any other file system call is made with it.

use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::vfs::error::WorkspaceError;

/// Enforces containment of caller paths inside one session root.
#[derive(Debug, Clone)]
pub struct SandboxPolicy {
    root: PathBuf,
}

impl SandboxPolicy {
    /// Creates a policy for `root`, resolving it to its canonical form.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be canonicalized (typically
    /// because it does not exist).
    pub fn new(root: &Path) -> Result<Self, WorkspaceError> {
        let root = dunce::canonicalize(root).map_err(|e| WorkspaceError::io(root, e))?;
        Ok(Self { root })
    }

    /// The canonical session root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path into the session root.
    ///
    /// Empty input and `.` resolve to the root itself only when `allow_root`
    /// is set. Absolute paths, drive-qualified paths and any `..` segment are
    /// rejected before the file system is consulted. The longest existing
    /// prefix of the joined path is canonicalized so that symlinks are
    /// followed, and the result must stay under the root.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Validation`] for malformed input, for paths
    /// that cannot be resolved, and for anything that lands outside the root.
    pub fn resolve(&self, raw: &str, allow_root: bool) -> Result<PathBuf, WorkspaceError> {
        let components = relative_components(raw, allow_root)?;
        if components.is_empty() {
            return Ok(self.root.clone());
        }

        let mut existing = self.root.clone();
        let mut remainder = components.as_slice();
        while let Some((head, tail)) = remainder.split_first() {
            let next = existing.join(head);
            if fs::symlink_metadata(&next).is_err() {
                break;
            }
            existing = next;
            remainder = tail;
        }

        // Dangling symlinks fail here, which is what we want: their target
        // cannot be checked against the root.
        let mut resolved = dunce::canonicalize(&existing).map_err(|_| {
            WorkspaceError::validation(format!(
                "Path '{}' cannot be resolved inside the workspace root.",
                raw.trim()
            ))
        })?;
        resolved.extend(remainder);

        if !resolved.starts_with(&self.root) {
            return Err(WorkspaceError::validation("Path escapes workspace root."));
        }
        Ok(resolved)
    }

    /// Returns `path` relative to the root, with `/` separators.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceError::Validation`] if `path` is not under the root.
    pub fn relative(&self, path: &Path) -> Result<String, WorkspaceError> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| WorkspaceError::validation("Path escapes workspace root."))?;
        Ok(to_posix(relative))
    }
}

/// Joins the components of a relative path with `/`.
pub(crate) fn to_posix(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalizes a caller path for echoing back: trimmed, `/` separators.
pub(crate) fn display_path(raw: &str) -> String {
    raw.trim().replace('\\', "/")
}

fn relative_components(raw: &str, allow_root: bool) -> Result<Vec<OsString>, WorkspaceError> {
    let value = raw.trim();
    if value.is_empty() || value == "." {
        return if allow_root {
            Ok(Vec::new())
        } else {
            Err(WorkspaceError::validation("path must not be empty."))
        };
    }
    if value.contains('\0') {
        return Err(WorkspaceError::validation("path must not contain NUL bytes."));
    }

    let normalized = value.replace('\\', "/");
    if has_drive_qualifier(&normalized) {
        return Err(WorkspaceError::validation(
            "Drive-qualified paths are not allowed.",
        ));
    }
    if normalized.starts_with('/') || Path::new(&normalized).is_absolute() {
        return Err(WorkspaceError::validation("Absolute paths are not allowed."));
    }

    let mut parts = Vec::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_os_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(WorkspaceError::validation(
                    "Path must not contain '..' segments.",
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(WorkspaceError::validation("Absolute paths are not allowed."));
            }
        }
    }

    if parts.is_empty() && !allow_root {
        return Err(WorkspaceError::validation("path must not be empty."));
    }
    Ok(parts)
}

fn has_drive_qualifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}
