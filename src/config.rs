//! Application configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::gateway::GatewayConfig;
use crate::pipeline::ReplyCacheConfig;

/// Bot-identity secret, shared with the sync relay.
pub const ENV_BOT_TOKEN: &str = "LINGUA_BOT_TOKEN";
/// Inference provider credential.
pub const ENV_PROVIDER_KEY: &str = "OPENAI_API_KEY";
/// Optional OpenAI-compatible base URL override.
pub const ENV_PROVIDER_URL: &str = "LINGUA_PROVIDER_URL";
/// Optional remote analytics base address; sync is disabled when absent.
pub const ENV_SYNC_URL: &str = "LINGUA_SYNC_URL";
/// Optional scratch directory for per-message audio.
pub const ENV_TEMP_DIR: &str = "LINGUA_TEMP_DIR";
/// Optional directory for the persistence database.
pub const ENV_DATA_DIR: &str = "LINGUA_DATA_DIR";

/// Rolling conversation window: most-recent turns kept per user.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Configuration errors surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("{0} is not set; add it to the environment")]
    MissingVar(&'static str),
    /// A URL-valued variable failed to parse.
    #[error("invalid url in {var}: {source}")]
    InvalidUrl {
        /// Variable name.
        var: &'static str,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Bot-identity secret.
    pub bot_token: String,
    /// Inference gateway settings.
    pub gateway: GatewayConfig,
    /// Remote analytics address; `None` disables the sync relay.
    pub sync_base_url: Option<Url>,
    /// Timeout for sync relay requests.
    pub sync_timeout: Duration,
    /// Scratch directory for per-message audio files.
    pub temp_dir: PathBuf,
    /// Directory holding the persistence database.
    pub data_dir: PathBuf,
    /// Rolling conversation window per user.
    pub context_window: usize,
    /// Bounds for the delivered-reply cache.
    pub reply_cache: ReplyCacheConfig,
}

impl AppConfig {
    /// Load the configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a URL-valued
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = require(ENV_BOT_TOKEN)?;
        let api_key = require(ENV_PROVIDER_KEY)?;

        let mut gateway = GatewayConfig::new(api_key);
        if let Some(base_url) = optional(ENV_PROVIDER_URL) {
            gateway = gateway.with_base_url(base_url.trim_end_matches('/'));
        }

        let sync_base_url = match optional(ENV_SYNC_URL) {
            Some(raw) => Some(Url::parse(raw.trim_end_matches('/')).map_err(|source| {
                ConfigError::InvalidUrl {
                    var: ENV_SYNC_URL,
                    source,
                }
            })?),
            None => None,
        };

        Ok(Self {
            bot_token,
            gateway,
            sync_base_url,
            sync_timeout: Duration::from_secs(10),
            temp_dir: optional(ENV_TEMP_DIR).map_or_else(|| PathBuf::from("temp"), PathBuf::from),
            data_dir: optional(ENV_DATA_DIR).map_or_else(|| PathBuf::from("data"), PathBuf::from),
            context_window: DEFAULT_CONTEXT_WINDOW,
            reply_cache: ReplyCacheConfig::default(),
        })
    }

    /// Path of the persistence database file.
    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("coach.sqlite")
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::MissingVar(var))
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            bot_token: "token".to_string(),
            gateway: GatewayConfig::new("sk-test"),
            sync_base_url: None,
            sync_timeout: Duration::from_secs(10),
            temp_dir: PathBuf::from("temp"),
            data_dir: PathBuf::from("data"),
            context_window: DEFAULT_CONTEXT_WINDOW,
            reply_cache: ReplyCacheConfig::default(),
        }
    }

    #[test]
    fn test_sqlite_path() {
        assert_eq!(config().sqlite_path(), PathBuf::from("data/coach.sqlite"));
    }

    #[test]
    fn test_gateway_settings_validate() {
        assert!(config().gateway.validate().is_ok());
    }
}
