//! Sandboxed workspace file system.

/// Zip export of a session root.
pub mod archive;
/// Call-chain scoped active-session binding.
pub mod context;
/// Error types for workspace operations.
pub mod error;
/// Session management for sandboxed roots.
pub mod manager;
/// File and directory operations on a session root.
pub mod ops;
/// Path containment guard.
pub mod policy;
/// Session-aware service facade.
pub mod service;
/// Recursive tree snapshots.
pub mod tree;

pub use error::{ErrorKind, WorkspaceError};
pub use manager::SessionManager;
pub use service::WorkspaceService;
