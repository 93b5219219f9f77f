//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::time::Duration;
use tracing::Level;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_SNIPPET_PREVIEW_CHARS: usize = 150;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub log_level: Level,
    /// Transport-level timeout. `None` leaves requests unbounded.
    pub http_timeout: Option<Duration>,
    pub snippet_preview_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            log_level: Level::INFO,
            http_timeout: None,
            snippet_preview_chars: DEFAULT_SNIPPET_PREVIEW_CHARS,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend Settings ---
        let api_base = lookup("POCKETRAG_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = api_base.trim().trim_end_matches('/').to_string();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "POCKETRAG_API_BASE".to_string(),
                format!("'{}' is not an http(s) URL", api_base),
            ));
        }

        let http_timeout = match lookup("POCKETRAG_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "POCKETRAG_HTTP_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive number of seconds", raw),
                    )
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        // --- Logging ---
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Presentation ---
        let snippet_preview_chars = match lookup("POCKETRAG_SNIPPET_PREVIEW_CHARS") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("POCKETRAG_SNIPPET_PREVIEW_CHARS".to_string(), e.to_string())
            })?,
            None => DEFAULT_SNIPPET_PREVIEW_CHARS,
        };

        Ok(Self {
            api_base,
            log_level,
            http_timeout,
            snippet_preview_chars,
        })
    }
}
