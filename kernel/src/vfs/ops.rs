//! File and directory operations on a session root.
//!
//! Every function takes the session root and a caller-supplied relative
//! path, and routes the path through [`SandboxPolicy`] before touching the
//! file system. Enumeration never follows symlinks.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::vfs::error::WorkspaceError;
use crate::vfs::policy::{display_path, SandboxPolicy};

/// Largest text payload, in characters, accepted by [`write_text`].
pub const MAX_EDITABLE_FILE_CHARS: usize = 400_000;

/// Result of [`list_flat_text_files`]: decoded text files plus the paths
/// that were skipped because they are not UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatTextListing {
    /// Root-relative path to file content.
    pub files: BTreeMap<String, String>,
    /// Root-relative paths of files that could not be decoded as text.
    pub skipped_binary: Vec<String>,
}

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// Returns [`WorkspaceError::NotFound`] if the path is missing or not a
/// regular file and [`WorkspaceError::BinaryFile`] if the bytes are not
/// valid UTF-8.
pub fn read_text(root: &Path, path: &str) -> Result<String, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let target = policy.resolve(path, false)?;
    if !target.is_file() {
        return Err(WorkspaceError::NotFound(format!(
            "{} does not exist.",
            display_path(path)
        )));
    }

    let bytes = fs::read(&target).map_err(|e| WorkspaceError::io(&target, e))?;
    String::from_utf8(bytes).map_err(|_| {
        WorkspaceError::BinaryFile(format!(
            "{} is binary and cannot be edited as text.",
            display_path(path)
        ))
    })
}

/// Writes a text file, creating parent directories and overwriting any
/// existing file. Returns the root-relative path written.
///
/// # Errors
///
/// Returns [`WorkspaceError::Validation`] if `content` is longer than
/// `max_chars` characters or the path is rejected.
pub fn write_text(
    root: &Path,
    path: &str,
    content: &str,
    max_chars: usize,
) -> Result<String, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let target = policy.resolve(path, false)?;

    let length = content.chars().count();
    if length > max_chars {
        return Err(WorkspaceError::Validation(format!(
            "content exceeds {max_chars} characters. Current length: {length}"
        )));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
    }
    fs::write(&target, content).map_err(|e| WorkspaceError::io(&target, e))?;
    debug!(path = %target.display(), bytes = content.len(), "Wrote workspace file");
    policy.relative(&target)
}

/// Creates a directory and its parents. Succeeds if it already exists.
///
/// # Errors
///
/// Returns [`WorkspaceError::Conflict`] if a non-directory already occupies
/// the path.
pub fn create_folder(root: &Path, path: &str) -> Result<String, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let target = policy.resolve(path, false)?;

    if target.exists() && !target.is_dir() {
        return Err(WorkspaceError::Conflict(format!(
            "{} already exists and is not a directory.",
            display_path(path)
        )));
    }
    fs::create_dir_all(&target).map_err(|e| WorkspaceError::io(&target, e))?;
    policy.relative(&target)
}

/// Deletes a file or directory. Non-empty directories require `recursive`.
///
/// Returns the requested path with `/` separators.
///
/// # Errors
///
/// Returns [`WorkspaceError::NotFound`] if nothing exists at the path and
/// [`WorkspaceError::Conflict`] for a non-empty directory without
/// `recursive`.
pub fn delete_path(root: &Path, path: &str, recursive: bool) -> Result<String, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let target = policy.resolve(path, false)?;

    let metadata = match fs::symlink_metadata(&target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(WorkspaceError::NotFound(format!(
                "{} does not exist.",
                display_path(path)
            )));
        }
        Err(e) => return Err(WorkspaceError::io(&target, e)),
    };

    if metadata.is_dir() {
        let has_children = fs::read_dir(&target)
            .map_err(|e| WorkspaceError::io(&target, e))?
            .next()
            .is_some();
        if has_children && !recursive {
            return Err(WorkspaceError::Conflict(format!(
                "{} is a non-empty directory. Use recursive=true to delete.",
                display_path(path)
            )));
        }
        if has_children {
            fs::remove_dir_all(&target).map_err(|e| WorkspaceError::io(&target, e))?;
        } else {
            fs::remove_dir(&target).map_err(|e| WorkspaceError::io(&target, e))?;
        }
    } else {
        fs::remove_file(&target).map_err(|e| WorkspaceError::io(&target, e))?;
    }

    debug!(path = %target.display(), recursive, "Deleted workspace path");
    Ok(display_path(path))
}

/// Moves `from` to `to`, creating the destination's parent directories.
///
/// # Errors
///
/// Returns [`WorkspaceError::NotFound`] if `from` is missing,
/// [`WorkspaceError::Conflict`] if `to` exists and `overwrite` is false,
/// and [`WorkspaceError::Validation`] when moving a directory into itself
/// or onto one of its ancestors.
pub fn rename_path(
    root: &Path,
    from: &str,
    to: &str,
    overwrite: bool,
) -> Result<String, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let source = policy.resolve(from, false)?;
    let target = policy.resolve(to, false)?;

    if fs::symlink_metadata(&source).is_err() {
        return Err(WorkspaceError::NotFound(format!(
            "{} does not exist.",
            display_path(from)
        )));
    }
    if source == target {
        return policy.relative(&target);
    }
    if target.starts_with(&source) {
        return Err(WorkspaceError::validation(format!(
            "Cannot move {} into itself.",
            display_path(from)
        )));
    }
    if source.starts_with(&target) {
        return Err(WorkspaceError::validation(format!(
            "Cannot move {} onto its own ancestor {}.",
            display_path(from),
            display_path(to)
        )));
    }

    if let Ok(existing) = fs::symlink_metadata(&target) {
        if !overwrite {
            return Err(WorkspaceError::Conflict(format!(
                "{} already exists.",
                display_path(to)
            )));
        }
        if existing.is_dir() {
            fs::remove_dir_all(&target).map_err(|e| WorkspaceError::io(&target, e))?;
        } else {
            fs::remove_file(&target).map_err(|e| WorkspaceError::io(&target, e))?;
        }
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
    }
    fs::rename(&source, &target).map_err(|e| WorkspaceError::io(&source, e))?;
    debug!(from = %source.display(), to = %target.display(), "Renamed workspace path");
    policy.relative(&target)
}

/// Lists every regular file under `directory`, recursively, as sorted
/// root-relative paths.
///
/// # Errors
///
/// Returns [`WorkspaceError::NotFound`] if `directory` is missing and
/// [`WorkspaceError::Validation`] if it is not a directory.
pub fn list_relative_files(root: &Path, directory: &str) -> Result<Vec<String>, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let target = policy.resolve(directory, true)?;
    if !target.exists() {
        return Err(WorkspaceError::NotFound(format!(
            "{} does not exist.",
            display_path(directory)
        )));
    }
    if !target.is_dir() {
        return Err(WorkspaceError::Validation(format!(
            "{} is not a directory.",
            display_path(directory)
        )));
    }
    walk_files(&policy, &target)
}

/// Reads every regular file under the root as UTF-8. Files that fail to
/// decode are reported in [`FlatTextListing::skipped_binary`] instead of
/// failing the call.
///
/// # Errors
///
/// Returns an error only if the tree cannot be walked or a file cannot be
/// read at all.
pub fn list_flat_text_files(root: &Path) -> Result<FlatTextListing, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let mut listing = FlatTextListing::default();

    for relative in walk_files(&policy, policy.root())? {
        let path = policy.root().join(&relative);
        let bytes = fs::read(&path).map_err(|e| WorkspaceError::io(&path, e))?;
        match String::from_utf8(bytes) {
            Ok(text) => {
                listing.files.insert(relative, text);
            }
            Err(_) => listing.skipped_binary.push(relative),
        }
    }
    Ok(listing)
}

/// Walks `directory` and returns sorted root-relative paths of regular
/// files. Symlinks are neither followed nor reported.
pub(crate) fn walk_files(
    policy: &SandboxPolicy,
    directory: &Path,
) -> Result<Vec<String>, WorkspaceError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(directory).to_path_buf();
            WorkspaceError::io(&path, e.into())
        })?;
        if entry.file_type().is_file() {
            files.push(policy.relative(entry.path())?);
        }
    }
    files.sort();
    Ok(files)
}
