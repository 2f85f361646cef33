use nullspace_client::RetryPolicy;
use serde::Deserialize;
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;
use url::Url;

fn default_event_timeout_ms() -> u64 {
    30_000
}

fn default_submit_max_attempts() -> usize {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    2_000
}

fn default_retry_submissions() -> bool {
    false
}

fn default_event_channel_capacity() -> usize {
    1_024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration for the gateway.
#[derive(Clone, Debug, Deserialize)]
pub struct GatewayConfig {
    pub ledger_url: String,
    #[serde(default = "default_event_timeout_ms")]
    pub event_timeout_ms: u64,
    #[serde(default = "default_submit_max_attempts")]
    pub submit_max_attempts: usize,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_retry_submissions")]
    pub retry_submissions: bool,
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl GatewayConfig {
    /// Configuration with every optional field at its default.
    pub fn new(ledger_url: impl Into<String>) -> Self {
        Self {
            ledger_url: ledger_url.into(),
            event_timeout_ms: default_event_timeout_ms(),
            submit_max_attempts: default_submit_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            retry_submissions: default_retry_submissions(),
            event_channel_capacity: default_event_channel_capacity(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: usize },
    #[error("{field} must be a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("{field} URL scheme must be http or https: {value}")]
    InvalidUrlScheme { field: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub ledger_url: Url,
    pub event_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub event_channel_capacity: usize,
    pub log_level: Level,
}

fn ensure_nonzero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}

fn ensure_nonzero_u64(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value: 0 });
    }
    Ok(())
}

fn validate_http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => {}
        _ => {
            return Err(ConfigError::InvalidUrlScheme {
                field,
                value: value.to_string(),
            })
        }
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(url)
}

impl GatewayConfig {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let ledger_url = validate_http_url("ledger_url", &self.ledger_url)?;
        ensure_nonzero_u64("event_timeout_ms", self.event_timeout_ms)?;
        ensure_nonzero("submit_max_attempts", self.submit_max_attempts)?;
        ensure_nonzero("event_channel_capacity", self.event_channel_capacity)?;
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            ledger_url,
            event_timeout: Duration::from_millis(self.event_timeout_ms),
            retry_policy: RetryPolicy {
                max_attempts: self.submit_max_attempts,
                initial_backoff: Duration::from_millis(self.initial_backoff_ms),
                max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)),
                retry_non_idempotent: self.retry_submissions,
            },
            event_channel_capacity: self.event_channel_capacity,
            log_level,
        })
    }
}
