pub mod api;
pub mod config;
pub mod core_state;
pub mod dates;
pub mod db;
pub mod history;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Anything that stops the service from starting or keeps it from serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Initialization error: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

pub fn run() -> Result<(), StartupError> {
    // Missing .env is normal; the process environment still applies.
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");
    let addr = config.addr;

    // The blocking completion client must be built before the runtime exists.
    let core = Arc::new(core_state::CoreState::from_config(config)?);

    // Fail fast on an unwritable database location and apply migrations once.
    core.open_db()?;
    tracing::info!(db_path = %core.db_path().display(), "Database ready");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(api::serve(core, addr, api::shutdown_signal()))?;
    Ok(())
}
