//! Application configuration loaded from the environment.

use mindmap_providers::{ProviderConfig, ProviderError};
use mindmap_retries::{HttpClientConfig, PolicyError, RetryPolicy, TransportError};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Default overall deadline for one generation, in seconds.
pub const DEFAULT_DEADLINE_SECS: u64 = 300;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable did not parse.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// Provider settings are invalid.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Retry settings are invalid.
    #[error("Invalid retry policy: {0}")]
    Policy(#[from] PolicyError),

    /// The HTTP client could not be built.
    #[error("Invalid HTTP client settings: {0}")]
    Http(#[from] TransportError),
}

/// Everything needed to wire the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Upstream provider settings.
    pub provider: ProviderConfig,
    /// HTTP client settings for upstream calls.
    pub http: HttpClientConfig,
    /// Retry policy for generation calls.
    pub retry: RetryPolicy,
    /// Listen address for the HTTP surface.
    pub bind: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            http: HttpClientConfig::default(),
            retry: RetryPolicy::default()
                .with_deadline(Some(Duration::from_secs(DEFAULT_DEADLINE_SECS))),
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl AppConfig {
    /// Load from process environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OPENAI_*` | see [`ProviderConfig::from_env`] |
    /// | `MINDMAP_MAX_ATTEMPTS` | 4 |
    /// | `MINDMAP_BASE_DELAY_MS` | 1000 |
    /// | `MINDMAP_MAX_DELAY_MS` | 60000 |
    /// | `MINDMAP_DEADLINE_SECS` | 300 (`0` disables) |
    /// | `MINDMAP_HTTP_TIMEOUT_SECS` | 60 |
    /// | `MINDMAP_INSECURE_TLS` | false |
    /// | `MINDMAP_BIND` | `127.0.0.1:8080` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let provider = ProviderConfig::from_lookup("OPENAI", &lookup)?;

        let default_policy = RetryPolicy::default();
        let max_attempts =
            parse::<u32>("MINDMAP_MAX_ATTEMPTS", var("MINDMAP_MAX_ATTEMPTS"))?
                .unwrap_or(default_policy.max_attempts());
        let base_delay = parse::<u64>("MINDMAP_BASE_DELAY_MS", var("MINDMAP_BASE_DELAY_MS"))?
            .map_or(default_policy.base_delay(), Duration::from_millis);
        let max_delay = parse::<u64>("MINDMAP_MAX_DELAY_MS", var("MINDMAP_MAX_DELAY_MS"))?
            .map_or(default_policy.max_delay(), Duration::from_millis);
        let deadline = parse::<u64>("MINDMAP_DEADLINE_SECS", var("MINDMAP_DEADLINE_SECS"))?
            .unwrap_or(DEFAULT_DEADLINE_SECS);

        let retry = RetryPolicy::new(max_attempts, base_delay, max_delay)?
            .with_deadline(Some(Duration::from_secs(deadline)));

        let mut http = defaults.http;
        if let Some(secs) =
            parse::<u64>("MINDMAP_HTTP_TIMEOUT_SECS", var("MINDMAP_HTTP_TIMEOUT_SECS"))?
        {
            http = http.timeout(Duration::from_secs(secs));
        }
        if let Some(insecure) = parse::<bool>("MINDMAP_INSECURE_TLS", var("MINDMAP_INSECURE_TLS"))? {
            http = http.danger_accept_invalid_certs(insecure);
        }

        let bind = parse::<SocketAddr>("MINDMAP_BIND", var("MINDMAP_BIND"))?
            .unwrap_or(defaults.bind);

        Ok(Self {
            provider,
            http,
            retry,
            bind,
        })
    }
}

fn parse<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.retry.max_attempts(), 4);
        assert_eq!(config.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(config.retry.deadline(), Some(Duration::from_secs(300)));
        assert!(!config.http.accept_invalid_certs);
        assert_eq!(config.provider.model, "gpt-4");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("MINDMAP_MAX_ATTEMPTS", "2"),
            ("MINDMAP_BASE_DELAY_MS", "250"),
            ("MINDMAP_MAX_DELAY_MS", "1000"),
            ("MINDMAP_DEADLINE_SECS", "0"),
            ("MINDMAP_HTTP_TIMEOUT_SECS", "15"),
            ("MINDMAP_INSECURE_TLS", "true"),
            ("MINDMAP_BIND", "0.0.0.0:9000"),
        ]))
        .unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.retry.max_attempts(), 2);
        assert_eq!(config.retry.delay_for(2), Duration::from_millis(500));
        assert_eq!(config.retry.deadline(), None);
        assert_eq!(config.http.timeout, Duration::from_secs(15));
        assert!(config.http.accept_invalid_certs);
        assert_eq!(config.bind.port(), 9000);
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(lookup(&[("MINDMAP_MAX_ATTEMPTS", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MINDMAP_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_invalid_policy() {
        let err = AppConfig::from_lookup(lookup(&[("MINDMAP_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Policy(PolicyError::ZeroAttempts)));
    }

    #[test]
    fn test_invalid_bind() {
        let err = AppConfig::from_lookup(lookup(&[("MINDMAP_BIND", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
