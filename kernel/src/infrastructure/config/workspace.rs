//! Workspace configuration for the kernel.
//!
//! This module defines where session roots live and how long they last.

use std::path::PathBuf;

use serde::Deserialize;

use crate::vfs::manager::SESSION_TTL_SECONDS;
use crate::vfs::ops::MAX_EDITABLE_FILE_CHARS;

/// Name of the directory under the system temp dir used when no base
/// directory is configured.
pub const DEFAULT_BASE_DIR_NAME: &str = "workbench-workspaces";

/// Workspace session settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    /// Directory holding one subdirectory per session.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Sliding expiry window for new sessions.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Largest text payload accepted by a write.
    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,
    /// Interval of the background reaper; `None` sweeps on access only.
    #[serde(default)]
    pub reaper_interval_secs: Option<u64>,
}

impl WorkspaceSettings {
    /// Settings rooted at `base_dir`, everything else default.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..Self::default()
        }
    }

    /// The configured base directory, or the default under the system
    /// temp dir.
    #[must_use]
    pub fn resolved_base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_BASE_DIR_NAME))
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            base_dir: None,
            session_ttl_secs: default_session_ttl(),
            max_file_chars: default_max_file_chars(),
            reaper_interval_secs: None,
        }
    }
}

pub(super) fn default_session_ttl() -> u64 {
    SESSION_TTL_SECONDS
}

pub(super) fn default_max_file_chars() -> usize {
    MAX_EDITABLE_FILE_CHARS
}
