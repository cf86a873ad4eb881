use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::completion::DEFAULT_GEMINI_URL;

/// Application-level constants
pub const APP_NAME: &str = "PainTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

pub const ENV_ADDR: &str = "PAINTRACK_ADDR";
pub const ENV_DB_PATH: &str = "PAINTRACK_DB_PATH";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_API_URL: &str = "GEMINI_API_URL";
pub const ENV_COMPLETION_TIMEOUT: &str = "PAINTRACK_COMPLETION_TIMEOUT_SECS";
pub const ENV_ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "paintrack=info,tower_http=info"
}

/// Get the application data directory
/// ~/PainTrack/ on all platforms; the working directory when home is unknown.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_db_path() -> PathBuf {
    app_data_dir().join("paintrack.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid bind address {value:?}: {reason}")]
    InvalidAddr { value: String, reason: String },
}

/// Runtime configuration, read once at startup.
///
/// Credentials are optional here. Requests that need a missing one fail
/// with a server error instead of the process refusing to start.
#[derive(Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    pub completion_timeout_secs: u64,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let addr_raw = get(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidAddr {
                value: addr_raw.clone(),
                reason: e.to_string(),
            })?;

        let completion_timeout_secs = match get(ENV_COMPLETION_TIMEOUT) {
            None => DEFAULT_COMPLETION_TIMEOUT_SECS,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        key = ENV_COMPLETION_TIMEOUT,
                        value = %raw,
                        default = DEFAULT_COMPLETION_TIMEOUT_SECS,
                        "Invalid timeout, using default"
                    );
                    DEFAULT_COMPLETION_TIMEOUT_SECS
                }
            },
        };

        Ok(Self {
            addr,
            db_path: get(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            gemini_api_key: get(ENV_GEMINI_API_KEY),
            gemini_api_url: get(ENV_GEMINI_API_URL)
                .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
            completion_timeout_secs,
            admin_password: get(ENV_ADMIN_PASSWORD),
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("AppConfig")
            .field("addr", &self.addr)
            .field("db_path", &self.db_path)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_api_url", &self.gemini_api_url)
            .field("completion_timeout_secs", &self.completion_timeout_secs)
            .field("admin_password", &redact(&self.admin_password))
            .finish()
    }
}
