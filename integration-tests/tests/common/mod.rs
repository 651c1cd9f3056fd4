//! Shared test utilities for integration tests.
//!
//! Provides a throwaway base directory with a workspace service, session
//! manager and agent tools wired on top of it.

#![allow(dead_code)]

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use workbench_kernel::infrastructure::config::WorkspaceSettings;
use workbench_kernel::tools::AgentTools;
use workbench_kernel::vfs::manager::{ManualClock, SessionManager};
use workbench_kernel::vfs::WorkspaceService;

/// Integration test context providing shared resources.
pub struct IntegrationTestContext {
    /// Temporary base directory holding every session root
    pub temp_dir: TempDir,
    /// Service under test
    pub service: Arc<WorkspaceService>,
    /// Clock driving session expiry
    pub clock: Arc<ManualClock>,
}

impl IntegrationTestContext {
    /// Creates a context with default settings and a manual clock.
    pub fn new() -> Result<Self> {
        Self::with_settings(|_| {})
    }

    /// Creates a context after letting `configure` adjust the settings.
    pub fn with_settings(configure: impl FnOnce(&mut WorkspaceSettings)) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let mut settings = WorkspaceSettings::with_base_dir(temp_dir.path());
        configure(&mut settings);

        let clock = Arc::new(ManualClock::default());
        let manager = SessionManager::with_clock(&settings, clock.clone())?;
        let service = Arc::new(WorkspaceService::with_manager(
            Arc::new(manager),
            settings.max_file_chars,
        ));

        Ok(Self {
            temp_dir,
            service,
            clock,
        })
    }

    /// Gets the base directory path.
    pub fn base_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Agent tools bound to this context's service.
    pub fn tools(&self) -> AgentTools {
        AgentTools::new(Arc::clone(&self.service))
    }

    /// Moves the manual clock forward.
    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(chrono::TimeDelta::seconds(secs));
    }
}
