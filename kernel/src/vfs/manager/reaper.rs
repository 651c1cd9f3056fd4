//! Periodic sweep of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::session::SessionManager;

/// Spawns a task that calls
/// [`SessionManager::cleanup_expired_sessions`] every `every`. The sweep
/// runs on the blocking pool since it deletes directories. Abort the
/// returned handle to stop it.
///
/// Must be called from within a tokio runtime. A zero interval is raised
/// to one millisecond.
pub fn spawn_reaper(sessions: Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_millis(1));
    info!("Starting session reaper, interval {:?}", every);
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let sessions = Arc::clone(&sessions);
            match tokio::task::spawn_blocking(move || sessions.cleanup_expired_sessions()).await {
                Ok(removed) if removed.is_empty() => {}
                Ok(removed) => debug!(count = removed.len(), "Reaper removed expired sessions"),
                Err(e) => warn!("Session reaper sweep failed: {}", e),
            }
        }
    })
}
