use serde::Serialize;
use tracing::{info, info_span};

/// Domain event for audit logging.
/// Structured for JSON serialization to enable machine-readable audit trails.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A session was registered and its root created.
    SessionCreated {
        /// Session id.
        workspace_id: String,
    },
    /// A session was deleted on request.
    SessionDeleted {
        /// Session id.
        workspace_id: String,
    },
    /// A session passed its expiry and was reclaimed.
    SessionExpired {
        /// Session id.
        workspace_id: String,
    },
    /// A caller path or payload failed validation.
    RequestRejected {
        /// Session id.
        workspace_id: String,
        /// Path as supplied by the caller.
        path: String,
        /// Validation message.
        reason: String,
    },
}

/// Logs an audit event to the dedicated audit channel as structured JSON.
/// This uses a specific `target` which can be filtered by the subscriber to redirect to a secure file.
pub fn log_audit(event: &AuditEvent) {
    let span = info_span!(target: "audit", "audit_event");
    let _enter = span.enter();

    let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    info!(target: "audit", audit_json = %json, "Security Audit Event");
}
