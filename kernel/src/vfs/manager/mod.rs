//! Session manager for sandboxed workspace roots.
//!
//! This module tracks which session ids are live, where their roots are,
//! and when they expire.

pub mod clock;
pub mod reaper;
pub mod session;
pub mod types;

// Re-export primary types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use reaper::spawn_reaper;
pub use session::SessionManager;
pub use types::{Session, SessionView, DEFAULT_SESSION_ID, SESSION_TTL_SECONDS};
