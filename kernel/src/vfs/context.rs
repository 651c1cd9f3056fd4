//! Call-chain scoped "active session" binding.
//!
//! Resolution precedence for the current session id, highest first:
//!
//! 1. an explicitly supplied, non-blank id;
//! 2. the id bound by the innermost enclosing [`scope`] or [`sync_scope`];
//! 3. [`DEFAULT_SESSION_ID`].
//!
//! The binding is a tokio task-local, so it follows one logical call chain
//! and is restored when the scope is left by any path: return, error,
//! panic, or the scoped future being dropped. It is not inherited by tasks
//! spawned from inside the scope; bind again there if needed.

use std::future::Future;

use crate::vfs::error::WorkspaceError;
use crate::vfs::manager::types::{normalize_session_id, DEFAULT_SESSION_ID};

tokio::task_local! {
    static ACTIVE_SESSION: String;
}

/// Runs `future` with `session_id` bound as the active session.
pub async fn scope<F: Future>(session_id: String, future: F) -> F::Output {
    ACTIVE_SESSION.scope(session_id, future).await
}

/// Runs `f` with `session_id` bound as the active session.
pub fn sync_scope<F, R>(session_id: String, f: F) -> R
where
    F: FnOnce() -> R,
{
    ACTIVE_SESSION.sync_scope(session_id, f)
}

/// Returns the session id bound in the current call chain, if any.
#[must_use]
pub fn active_session_id() -> Option<String> {
    ACTIVE_SESSION.try_with(Clone::clone).ok()
}

/// Resolves the effective session id for a call.
///
/// # Errors
///
/// Returns [`WorkspaceError::Validation`] if the winning id is malformed.
pub fn effective_session_id(explicit: Option<&str>) -> Result<String, WorkspaceError> {
    if let Some(id) = explicit.filter(|id| !id.trim().is_empty()) {
        return normalize_session_id(Some(id));
    }
    match active_session_id() {
        Some(id) if !id.trim().is_empty() => normalize_session_id(Some(&id)),
        _ => Ok(DEFAULT_SESSION_ID.to_string()),
    }
}
