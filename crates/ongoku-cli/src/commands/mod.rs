//! Command handlers

pub mod auth;
pub mod config;
pub mod project;
pub mod status;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};

use ongoku::{
    load_settings, ApiClient, AuthProvider, CommandGitDriver, FileSessionStore, Settings,
    SyncOrchestrator,
};

pub type Orchestrator = SyncOrchestrator<ApiClient, CommandGitDriver>;

/// Settings and account session for one invocation.
pub struct Session {
    pub settings: Settings,
    pub store: FileSessionStore,
}

impl Session {
    pub fn load() -> Result<Self> {
        let settings = load_settings().context("Failed to load settings")?;
        let store = FileSessionStore::open_default()?;
        Ok(Self { settings, store })
    }

    pub fn client(&self) -> Result<ApiClient> {
        let token = self.store.token()?;
        Ok(ApiClient::new(&self.settings.api_url, token)?)
    }

    /// Orchestrator working on `directory`.
    pub fn orchestrator(&self, directory: &Path) -> Result<Orchestrator> {
        Ok(SyncOrchestrator::new(
            self.client()?,
            CommandGitDriver::new(directory),
            Box::new(self.store.clone()),
        ))
    }
}
