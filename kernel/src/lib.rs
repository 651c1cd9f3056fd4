//! Workbench Kernel - sandboxed, session-scoped workspaces for agent
//! workflows.
//!
//! Each workspace session owns a private directory under a shared base.
//! Sessions expire after a sliding TTL, every caller-supplied path is
//! confined to its session root, and the active session can be bound to a
//! call chain so agent tools reach the right workspace without threading an
//! id through every call.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Infrastructure components (audit, config, telemetry).
pub mod infrastructure;
/// File tools for agent workflows.
pub mod tools;
/// Virtual file system for sandboxed workspace sessions.
pub mod vfs;
