//! Session-aware entry point for workspace file operations.
//!
//! Each call resolves its session id through the precedence rules in
//! [`crate::vfs::context`], sweeps expired sessions, ensures the target
//! session, and only then runs the requested operation on its root.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::instrument;

use crate::infrastructure::audit::{log_audit, AuditEvent};
use crate::infrastructure::config::WorkspaceSettings;
use crate::vfs::context;
use crate::vfs::error::{ErrorKind, WorkspaceError};
use crate::vfs::manager::{spawn_reaper, Session, SessionManager, SessionView};
use crate::vfs::ops::{self, FlatTextListing};
use crate::vfs::tree::{self, TreeNode};
use crate::vfs::archive;

/// Workspace operations bound to a shared [`SessionManager`].
#[derive(Debug, Clone)]
pub struct WorkspaceService {
    sessions: Arc<SessionManager>,
    max_file_chars: usize,
}

impl WorkspaceService {
    /// Creates a service with its own session manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the session manager cannot be initialized.
    pub fn new(settings: &WorkspaceSettings) -> Result<Self, WorkspaceError> {
        Ok(Self::with_manager(
            Arc::new(SessionManager::new(settings)?),
            settings.max_file_chars,
        ))
    }

    /// Creates a service on top of an existing session manager.
    #[must_use]
    pub fn with_manager(sessions: Arc<SessionManager>, max_file_chars: usize) -> Self {
        Self {
            sessions,
            max_file_chars,
        }
    }

    /// The underlying session manager.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Largest text payload accepted by [`write_text`](Self::write_text).
    #[must_use]
    pub fn max_file_chars(&self) -> usize {
        self.max_file_chars
    }

    /// Starts the background reaper when `settings` configures a non-zero
    /// interval. Must be called from within a tokio runtime.
    #[must_use]
    pub fn start_reaper(&self, settings: &WorkspaceSettings) -> Option<JoinHandle<()>> {
        settings
            .reaper_interval_secs
            .filter(|secs| *secs > 0)
            .map(|secs| spawn_reaper(Arc::clone(&self.sessions), Duration::from_secs(secs)))
    }

    /// Creates a session under a fresh id.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::create_session`].
    pub fn create_session(&self, ttl_seconds: Option<u64>) -> Result<Session, WorkspaceError> {
        self.sessions.cleanup_expired_sessions();
        self.sessions.create_session(ttl_seconds)
    }

    /// Renews a session, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::touch_session`].
    pub fn touch_session(
        &self,
        session_id: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<Session, WorkspaceError> {
        self.sessions.cleanup_expired_sessions();
        self.sessions.touch_session(session_id, ttl_seconds)
    }

    /// Deletes a session and its root.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::delete_session`].
    pub fn delete_session(&self, session_id: &str) -> Result<bool, WorkspaceError> {
        self.sessions.cleanup_expired_sessions();
        self.sessions.delete_session(session_id)
    }

    /// Public views of every registered session, sorted by id.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<SessionView> {
        self.sessions.list_sessions()
    }

    /// Resolves the effective session for a call and renews it.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective id is malformed or the root cannot
    /// be prepared.
    pub fn resolve_session(&self, session_id: Option<&str>) -> Result<Session, WorkspaceError> {
        let id = context::effective_session_id(session_id)?;
        self.sessions.resolve_session(Some(&id))
    }

    /// Root directory of the effective session.
    ///
    /// # Errors
    ///
    /// See [`resolve_session`](Self::resolve_session).
    pub fn root(&self, session_id: Option<&str>) -> Result<PathBuf, WorkspaceError> {
        Ok(self.resolve_session(session_id)?.root)
    }

    /// Ensures the effective session, then runs `future` with it bound as
    /// the active session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be resolved; errors produced
    /// by `future` are returned inside `Ok`.
    pub async fn bind<F: Future>(
        &self,
        session_id: Option<&str>,
        future: F,
    ) -> Result<F::Output, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        Ok(context::scope(session.id, future).await)
    }

    /// Synchronous counterpart of [`bind`](Self::bind).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be resolved.
    pub fn bind_sync<F, R>(&self, session_id: Option<&str>, f: F) -> Result<R, WorkspaceError>
    where
        F: FnOnce() -> R,
    {
        let session = self.resolve_session(session_id)?;
        Ok(context::sync_scope(session.id, f))
    }

    /// Recursive tree of the session root.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be resolved or the tree
    /// cannot be read.
    #[instrument(skip(self))]
    pub fn list_tree(&self, session_id: Option<&str>) -> Result<Vec<TreeNode>, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        tree::list_tree(&session.root)
    }

    /// Sorted relative paths of every file under `directory`.
    ///
    /// # Errors
    ///
    /// See [`ops::list_relative_files`].
    #[instrument(skip(self))]
    pub fn list_relative_files(
        &self,
        session_id: Option<&str>,
        directory: &str,
    ) -> Result<Vec<String>, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        audited(&session, directory, ops::list_relative_files(&session.root, directory))
    }

    /// Every text file under the root plus the binary files skipped.
    ///
    /// # Errors
    ///
    /// See [`ops::list_flat_text_files`].
    #[instrument(skip(self))]
    pub fn list_flat_text_files(
        &self,
        session_id: Option<&str>,
    ) -> Result<FlatTextListing, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        ops::list_flat_text_files(&session.root)
    }

    /// Reads a text file.
    ///
    /// # Errors
    ///
    /// See [`ops::read_text`].
    #[instrument(skip(self))]
    pub fn read_text(&self, session_id: Option<&str>, path: &str) -> Result<String, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        audited(&session, path, ops::read_text(&session.root, path))
    }

    /// Writes a text file and returns its relative path.
    ///
    /// # Errors
    ///
    /// See [`ops::write_text`].
    #[instrument(skip(self, content), fields(chars = content.chars().count()))]
    pub fn write_text(
        &self,
        session_id: Option<&str>,
        path: &str,
        content: &str,
    ) -> Result<String, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        audited(
            &session,
            path,
            ops::write_text(&session.root, path, content, self.max_file_chars),
        )
    }

    /// Creates a folder and returns its relative path.
    ///
    /// # Errors
    ///
    /// See [`ops::create_folder`].
    #[instrument(skip(self))]
    pub fn create_folder(&self, session_id: Option<&str>, path: &str) -> Result<String, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        audited(&session, path, ops::create_folder(&session.root, path))
    }

    /// Deletes a file or directory.
    ///
    /// # Errors
    ///
    /// See [`ops::delete_path`].
    #[instrument(skip(self))]
    pub fn delete_path(
        &self,
        session_id: Option<&str>,
        path: &str,
        recursive: bool,
    ) -> Result<String, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        audited(&session, path, ops::delete_path(&session.root, path, recursive))
    }

    /// Renames a path and returns the new relative path.
    ///
    /// # Errors
    ///
    /// See [`ops::rename_path`].
    #[instrument(skip(self))]
    pub fn rename_path(
        &self,
        session_id: Option<&str>,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> Result<String, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        let requested = format!("{from} -> {to}");
        audited(
            &session,
            &requested,
            ops::rename_path(&session.root, from, to, overwrite),
        )
    }

    /// Zip archive of the whole session root.
    ///
    /// # Errors
    ///
    /// See [`archive::build_zip`].
    #[instrument(skip(self))]
    pub fn build_zip(&self, session_id: Option<&str>) -> Result<Vec<u8>, WorkspaceError> {
        let session = self.resolve_session(session_id)?;
        archive::build_zip(&session.root)
    }
}

fn audited<T>(
    session: &Session,
    path: &str,
    result: Result<T, WorkspaceError>,
) -> Result<T, WorkspaceError> {
    if let Err(e) = &result {
        if e.kind() == ErrorKind::Validation {
            log_audit(&AuditEvent::RequestRejected {
                workspace_id: session.id().to_string(),
                path: path.to_string(),
                reason: e.to_string(),
            });
        }
    }
    result
}
