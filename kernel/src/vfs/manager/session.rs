//! Session management for sandboxed workspace roots.
//!
//! This module owns the table of live sessions. Every table mutation happens
//! under a single mutex. Root removal happens under that mutex together with
//! the entry removal, so a concurrent recreate of the same id can never lose
//! its fresh root. Root creation may run outside it since `create_dir_all`
//! is idempotent.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::TimeDelta;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::types::{normalize_session_id, ttl_delta, Session, SessionView};
use crate::infrastructure::audit::{log_audit, AuditEvent};
use crate::infrastructure::config::WorkspaceSettings;
use crate::vfs::error::WorkspaceError;

enum Lookup {
    Live(Session),
    Expired,
    Relocated,
    Missing,
}

/// Registry of workspace sessions, keyed by session id.
pub struct SessionManager {
    sessions: Mutex<HashMap<String, Session>>,
    base_dir: RwLock<PathBuf>,
    default_ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_count", &self.sessions.lock().len())
            .field("base_dir", &*self.base_dir.read())
            .field("default_ttl", &self.default_ttl)
            .field("clock", &self.clock)
            .finish()
    }
}

impl SessionManager {
    /// Creates a session manager using wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured TTL is invalid or the base
    /// directory cannot be created.
    pub fn new(settings: &WorkspaceSettings) -> Result<Self, WorkspaceError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Creates a session manager driven by `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured TTL is invalid or the base
    /// directory cannot be created.
    pub fn with_clock(
        settings: &WorkspaceSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WorkspaceError> {
        let base_dir = prepare_base_dir(&settings.resolved_base_dir())?;
        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            base_dir: RwLock::new(base_dir),
            default_ttl: ttl_delta(settings.session_ttl_secs)?,
            clock,
        })
    }

    /// Canonical directory under which every session root lives.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.read().clone()
    }

    /// Moves the base directory. Cached sessions whose root no longer matches
    /// are re-rooted on their next access; their old directories are left
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the new base directory cannot be created.
    pub fn set_base_dir(&self, base_dir: &Path) -> Result<(), WorkspaceError> {
        let prepared = prepare_base_dir(base_dir)?;
        info!("Workspace base directory set to {:?}", prepared);
        *self.base_dir.write() = prepared;
        Ok(())
    }

    /// Root directory a session with `session_id` has under the current base.
    #[must_use]
    pub fn session_root(&self, session_id: &str) -> PathBuf {
        self.base_dir.read().join(session_id)
    }

    /// Default TTL applied to new sessions, in seconds.
    #[must_use]
    pub fn default_ttl_seconds(&self) -> i64 {
        self.default_ttl.num_seconds()
    }

    /// Creates a session under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the TTL is invalid or the root directory cannot
    /// be created.
    #[instrument(skip(self))]
    pub fn create_session(&self, ttl_seconds: Option<u64>) -> Result<Session, WorkspaceError> {
        let ttl = ttl_seconds
            .map(ttl_delta)
            .transpose()?
            .unwrap_or(self.default_ttl);
        let now = self.clock.now();

        let session = {
            let mut sessions = self.sessions.lock();
            loop {
                let candidate = Uuid::new_v4().simple().to_string();
                if let Entry::Vacant(vacant) = sessions.entry(candidate) {
                    let id = vacant.key().clone();
                    let root = self.session_root(&id);
                    break vacant.insert(Session::new(id, root, now, ttl)).clone();
                }
            }
        };

        if let Err(e) = create_root(&session.root) {
            self.sessions.lock().remove(&session.id);
            return Err(e);
        }

        info!("Created session {} at {:?}", session.id, session.root);
        log_audit(&AuditEvent::SessionCreated {
            workspace_id: session.id.clone(),
        });
        Ok(session)
    }

    /// Resolves `session_id` (the default session when blank) to a live
    /// session, creating it when absent and recreating it when expired.
    /// Every call slides the expiry window forward.
    ///
    /// `ttl_seconds` only applies when a new session is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or TTL is invalid, or if the root
    /// directory cannot be created or an expired root cannot be removed.
    #[instrument(skip(self))]
    pub fn ensure_session(
        &self,
        session_id: Option<&str>,
        ttl_seconds: Option<u64>,
    ) -> Result<Session, WorkspaceError> {
        let id = normalize_session_id(session_id)?;
        let ttl = ttl_seconds.map(ttl_delta).transpose()?;
        let root = self.session_root(&id);
        let now = self.clock.now();

        let lookup = {
            let mut sessions = self.sessions.lock();
            let state = sessions
                .get(&id)
                .map(|s| (s.root == root, s.is_expired(now)));
            match state {
                Some((true, false)) => sessions.get_mut(&id).map_or(Lookup::Missing, |s| {
                    s.renew(now, None);
                    Lookup::Live(s.clone())
                }),
                Some((true, true)) => {
                    sessions.remove(&id);
                    purge_root(&root)?;
                    Lookup::Expired
                }
                Some((false, _)) => {
                    sessions.remove(&id);
                    Lookup::Relocated
                }
                None => Lookup::Missing,
            }
        };

        match lookup {
            Lookup::Live(session) => {
                create_root(&session.root)?;
                return Ok(session);
            }
            Lookup::Expired => {
                info!("Session {} expired, recreating", id);
                log_audit(&AuditEvent::SessionExpired {
                    workspace_id: id.clone(),
                });
            }
            Lookup::Relocated => {
                debug!("Session {} root moved to {:?}", id, root);
            }
            Lookup::Missing => {}
        }

        create_root(&root)?;

        let now = self.clock.now();
        let (session, created) = {
            let mut sessions = self.sessions.lock();
            match sessions.entry(id.clone()) {
                Entry::Occupied(mut occupied) => {
                    occupied.get_mut().renew(now, None);
                    (occupied.get().clone(), false)
                }
                Entry::Vacant(vacant) => {
                    let session = Session::new(id, root, now, ttl.unwrap_or(self.default_ttl));
                    (vacant.insert(session).clone(), true)
                }
            }
        };

        if created {
            info!("Created session {} at {:?}", session.id, session.root);
            log_audit(&AuditEvent::SessionCreated {
                workspace_id: session.id.clone(),
            });
        }
        Ok(session)
    }

    /// Renews a session, creating it first if it does not exist. A given
    /// `ttl_seconds` replaces the session's stored TTL.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as
    /// [`ensure_session`](Self::ensure_session).
    #[instrument(skip(self))]
    pub fn touch_session(
        &self,
        session_id: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<Session, WorkspaceError> {
        let ttl = ttl_seconds.map(ttl_delta).transpose()?;
        let ensured = self.ensure_session(Some(session_id), ttl_seconds)?;

        let now = self.clock.now();
        let mut sessions = self.sessions.lock();
        Ok(match sessions.get_mut(&ensured.id) {
            Some(session) => {
                session.renew(now, ttl);
                session.clone()
            }
            None => ensured,
        })
    }

    /// Removes a session and recursively deletes its root. Returns whether
    /// a registry entry or a root directory existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is invalid or the root cannot be removed.
    #[instrument(skip(self))]
    pub fn delete_session(&self, session_id: &str) -> Result<bool, WorkspaceError> {
        let id = normalize_session_id(Some(session_id))?;
        let existed = {
            let mut sessions = self.sessions.lock();
            let removed = sessions.remove(&id);
            let target = removed
                .as_ref()
                .map_or_else(|| self.session_root(&id), |s| s.root.clone());
            purge_root(&target)? || removed.is_some()
        };
        if existed {
            info!("Deleted session {}", id);
            log_audit(&AuditEvent::SessionDeleted { workspace_id: id });
        }
        Ok(existed)
    }

    /// Removes every expired session and deletes its root. Returns the ids
    /// removed, sorted.
    ///
    /// The expiry decision, the removal of each entry and the deletion of
    /// its root all happen under one lock acquisition, so a session renewed
    /// or recreated concurrently is never swept.
    pub fn cleanup_expired_sessions(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut expired = Vec::new();
        {
            let mut sessions = self.sessions.lock();
            sessions.retain(|_, session| {
                if session.is_expired(now) {
                    expired.push(session.clone());
                    false
                } else {
                    true
                }
            });
            for session in &expired {
                if let Err(e) = purge_root(&session.root) {
                    warn!("Failed to remove root of expired session {}: {}", session.id, e);
                }
            }
        }
        expired.sort_by(|a, b| a.id.cmp(&b.id));

        for session in &expired {
            info!("Cleaning up expired session: {}", session.id);
            log_audit(&AuditEvent::SessionExpired {
                workspace_id: session.id.clone(),
            });
        }

        expired.into_iter().map(|s| s.id).collect()
    }

    /// Sweeps expired sessions, then ensures `session_id`.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as
    /// [`ensure_session`](Self::ensure_session).
    pub fn resolve_session(&self, session_id: Option<&str>) -> Result<Session, WorkspaceError> {
        self.cleanup_expired_sessions();
        self.ensure_session(session_id, None)
    }

    /// Returns a snapshot of a session without renewing it.
    #[must_use]
    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().get(session_id).cloned()
    }

    /// Returns the public view of every registered session, sorted by id.
    #[must_use]
    pub fn list_sessions(&self) -> Vec<SessionView> {
        let mut views: Vec<SessionView> = self
            .sessions
            .lock()
            .values()
            .map(Session::to_public)
            .collect();
        views.sort_by(|a, b| a.workspace_id.cmp(&b.workspace_id));
        views
    }

    /// Returns the number of registered sessions.
    #[must_use]
    pub fn active_session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

fn prepare_base_dir(base_dir: &Path) -> Result<PathBuf, WorkspaceError> {
    fs::create_dir_all(base_dir).map_err(|e| WorkspaceError::io(base_dir, e))?;
    dunce::canonicalize(base_dir).map_err(|e| WorkspaceError::io(base_dir, e))
}

fn create_root(root: &Path) -> Result<(), WorkspaceError> {
    fs::create_dir_all(root).map_err(|e| WorkspaceError::io(root, e))
}

/// Deletes a session root. Returns false if it did not exist.
fn purge_root(root: &Path) -> Result<bool, WorkspaceError> {
    match fs::remove_dir_all(root) {
        Ok(()) => {
            debug!("Removed session directory: {:?}", root);
            Ok(true)
        }
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
        Err(e) => Err(WorkspaceError::io(root, e)),
    }
}
