//! Application state shared by every request handler.
//!
//! Nothing here is mutable: each request opens its own database connection
//! and the completion client is stateless, so `CoreState` needs no locks.

use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::pipeline::completion::{CompletionClient, CompletionError, GeminiClient};

pub struct CoreState {
    pub config: AppConfig,
    completion: Arc<dyn CompletionClient>,
}

impl CoreState {
    pub fn new(config: AppConfig, completion: Arc<dyn CompletionClient>) -> Self {
        Self { config, completion }
    }

    /// Build the production state with a Gemini client.
    ///
    /// Must run outside the async runtime: the blocking HTTP client owns its
    /// own runtime internally.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let client = GeminiClient::new(
            &config.gemini_api_url,
            config.gemini_api_key.clone(),
            config.completion_timeout_secs,
        )?;
        if !client.has_api_key() {
            tracing::warn!("GEMINI_API_KEY not set; chat requests will fail until it is");
        }
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.config.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.config.db_path
    }

    /// Owned handle for use inside `spawn_blocking`.
    pub fn completion(&self) -> Arc<dyn CompletionClient> {
        Arc::clone(&self.completion)
    }

    pub fn admin_password(&self) -> Option<&str> {
        self.config.admin_password.as_deref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Completion client error: {0}")]
    Completion(#[from] CompletionError),
}
