//! Types for workspace session management.
//!
//! This module provides the session record, its public view, and the
//! validation rules for session ids and TTLs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::vfs::error::WorkspaceError;

/// Id of the session used when no id is supplied or bound.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Default sliding expiry window, in seconds.
pub const SESSION_TTL_SECONDS: u64 = 60 * 60;

/// Longest accepted TTL, in seconds (one year).
pub const MAX_SESSION_TTL_SECONDS: u64 = 366 * 24 * 60 * 60;

/// Longest accepted session id.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Normalizes a session id: blank maps to [`DEFAULT_SESSION_ID`], anything
/// else must match `[A-Za-z0-9_-]{1,128}`.
///
/// # Errors
///
/// Returns [`WorkspaceError::Validation`] for ids outside the allowed
/// charset or length.
pub fn normalize_session_id(session_id: Option<&str>) -> Result<String, WorkspaceError> {
    let value = session_id.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Ok(DEFAULT_SESSION_ID.to_string());
    }
    let well_formed = value.len() <= MAX_SESSION_ID_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !well_formed {
        return Err(WorkspaceError::validation(
            "workspace_id must match [A-Za-z0-9_-] and be <= 128 characters.",
        ));
    }
    Ok(value.to_string())
}

/// Converts a TTL in seconds into a [`TimeDelta`].
///
/// # Errors
///
/// Returns [`WorkspaceError::Validation`] if the TTL is zero or longer than
/// [`MAX_SESSION_TTL_SECONDS`].
pub fn ttl_delta(ttl_seconds: u64) -> Result<TimeDelta, WorkspaceError> {
    if ttl_seconds == 0 || ttl_seconds > MAX_SESSION_TTL_SECONDS {
        return Err(WorkspaceError::validation(format!(
            "ttl_seconds must be between 1 and {MAX_SESSION_TTL_SECONDS}."
        )));
    }
    i64::try_from(ttl_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| WorkspaceError::validation("ttl_seconds is out of range."))
}

/// One registered sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub(crate) id: String,
    pub(crate) root: PathBuf,
    pub(crate) last_accessed: DateTime<Utc>,
    pub(crate) expires_at: DateTime<Utc>,
    pub(crate) ttl: TimeDelta,
}

impl Session {
    pub(crate) fn new(id: String, root: PathBuf, now: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            id,
            root,
            last_accessed: now,
            expires_at: now + ttl,
            ttl,
        }
    }

    /// Session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute root directory of the session.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last time the session was resolved or renewed.
    #[must_use]
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    /// Instant at which the session becomes eligible for reclamation.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Renewal window in whole seconds.
    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Slides the expiry window forward from `now`, optionally replacing the
    /// TTL. The expiry never moves backwards or stands still, even when the
    /// clock does not advance between renewals.
    pub(crate) fn renew(&mut self, now: DateTime<Utc>, ttl: Option<TimeDelta>) {
        if let Some(ttl) = ttl {
            self.ttl = ttl;
        }
        self.last_accessed = now;
        let candidate = now + self.ttl;
        self.expires_at = if candidate > self.expires_at {
            candidate
        } else {
            self.expires_at + TimeDelta::microseconds(1)
        };
    }

    /// The caller-facing view of this session.
    #[must_use]
    pub fn to_public(&self) -> SessionView {
        SessionView {
            workspace_id: self.id.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Public projection of a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Session id.
    pub workspace_id: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_id_maps_to_default() -> anyhow::Result<()> {
        assert_eq!(normalize_session_id(None)?, DEFAULT_SESSION_ID);
        assert_eq!(normalize_session_id(Some(""))?, DEFAULT_SESSION_ID);
        assert_eq!(normalize_session_id(Some("   "))?, DEFAULT_SESSION_ID);
        assert_eq!(normalize_session_id(Some(" abc-1_2 "))?, "abc-1_2");
        Ok(())
    }

    #[test]
    fn test_rejects_bad_ids() {
        let too_long = "x".repeat(129);
        for bad in ["../x", "a/b", "a b", "dot.ted", "ünïcode", too_long.as_str()] {
            assert!(
                normalize_session_id(Some(bad)).is_err(),
                "{bad:?} should be rejected"
            );
        }
        assert!(normalize_session_id(Some(&"x".repeat(128))).is_ok());
    }

    #[test]
    fn test_ttl_bounds() {
        assert!(ttl_delta(0).is_err());
        assert!(ttl_delta(u64::MAX).is_err());
        assert!(ttl_delta(MAX_SESSION_TTL_SECONDS + 1).is_err());
        assert_eq!(ttl_delta(90).map(|d| d.num_seconds()).ok(), Some(90));
    }

    #[test]
    fn test_renew_strictly_increases_expiry_on_frozen_clock() -> anyhow::Result<()> {
        let now = Utc::now();
        let mut session = Session::new("s".into(), PathBuf::from("/tmp/s"), now, ttl_delta(60)?);
        let first = session.expires_at();

        session.renew(now, None);
        assert!(session.expires_at() > first);

        let second = session.expires_at();
        session.renew(now + TimeDelta::seconds(30), None);
        assert!(session.expires_at() > second);
        assert_eq!(session.expires_at(), now + TimeDelta::seconds(90));
        Ok(())
    }

    #[test]
    fn test_expiry_is_inclusive() -> anyhow::Result<()> {
        let now = Utc::now();
        let session = Session::new("s".into(), PathBuf::from("/tmp/s"), now, ttl_delta(10)?);
        assert!(!session.is_expired(now + TimeDelta::seconds(9)));
        assert!(session.is_expired(now + TimeDelta::seconds(10)));
        Ok(())
    }
}
