//! Remote backend configuration.
//!
//! Values required to reach the hosted sync table. Secret-free: the api
//! key is the backend's publishable anon key, safe to ship in clients.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Remote table name used when none is configured
pub const DEFAULT_TABLE_NAME: &str = "temple_data";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;

/// Configuration for the hosted sync backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Backend project URL, e.g. `https://project.example.co`
    pub base_url: String,
    /// Publishable API key sent with every request
    pub api_key: String,
    /// Sync table name
    pub table_name: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Startup connectivity probe bound
    pub probe_timeout: Duration,
    /// Maximum attempts for transient failures
    pub retry_attempts: u32,
    /// Base delay between attempts; grows linearly per attempt
    pub retry_delay: Duration,
}

impl RemoteConfig {
    /// Create a validated configuration with default table and timing
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let base_url = normalize_text_option(Some(base_url.into()))
            .ok_or_else(|| Error::InvalidInput("remote base URL must not be empty".to_string()))?;
        if !is_http_url(&base_url) {
            return Err(Error::InvalidInput(
                "remote base URL must include http:// or https://".to_string(),
            ));
        }

        let api_key = normalize_text_option(Some(api_key.into()))
            .ok_or_else(|| Error::InvalidInput("remote API key must not be empty".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        })
    }

    /// Override the sync table name
    #[must_use]
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Override retry behavior for transient failures
    #[must_use]
    pub const fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    /// Override the per-request and probe timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, request: Duration, probe: Duration) -> Self {
        self.request_timeout = request;
        self.probe_timeout = probe;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_urls() {
        assert!(RemoteConfig::new("", "key").is_err());
        assert!(RemoteConfig::new("project.example.co", "key").is_err());
        assert!(RemoteConfig::new("https://project.example.co", " ").is_err());
    }

    #[test]
    fn new_normalizes_trailing_slash() {
        let config = RemoteConfig::new("https://project.example.co/", "anon").unwrap();
        assert_eq!(config.base_url, "https://project.example.co");
        assert_eq!(config.table_name, DEFAULT_TABLE_NAME);
        assert_eq!(config.retry_attempts, 3);
    }

    #[test]
    fn builders_override_defaults() {
        let config = RemoteConfig::new("https://project.example.co", "anon")
            .unwrap()
            .with_table_name("ledger_rows")
            .with_retry(5, Duration::from_millis(100));
        assert_eq!(config.table_name, "ledger_rows");
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.retry_delay, Duration::from_millis(100));
    }
}
