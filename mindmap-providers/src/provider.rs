//! Provider configuration.

use std::str::FromStr;
use url::Url;

/// Default OpenAI API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Configuration for the upstream chat-completion provider.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: Option<String>,
    /// Base URL override.
    pub base_url: Option<String>,
    /// Organization ID.
    pub organization: Option<String>,
    /// Project ID.
    pub project: Option<String>,
    /// Chat model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            organization: None,
            project: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl ProviderConfig {
    /// Create a new empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the organization.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Set the project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Load from environment variables with a prefix.
    ///
    /// Reads `{prefix}_API_KEY`, `{prefix}_BASE_URL`, `{prefix}_ORGANIZATION`,
    /// `{prefix}_PROJECT`, `{prefix}_MODEL`, `{prefix}_TEMPERATURE` and
    /// `{prefix}_MAX_TOKENS`. Unset variables keep their defaults.
    pub fn from_env(prefix: &str) -> Result<Self, ProviderError> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}_{}", prefix, name)).filter(|value| !value.trim().is_empty())
        };
        let defaults = Self::default();

        Ok(Self {
            api_key: var("API_KEY"),
            base_url: var("BASE_URL"),
            organization: var("ORGANIZATION"),
            project: var("PROJECT"),
            model: var("MODEL").unwrap_or(defaults.model),
            temperature: parse_var(prefix, "TEMPERATURE", var("TEMPERATURE"))?
                .unwrap_or(defaults.temperature),
            max_tokens: parse_var(prefix, "MAX_TOKENS", var("MAX_TOKENS"))?
                .unwrap_or(defaults.max_tokens),
        })
    }

    /// Base URL with the default applied.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Full chat completions endpoint.
    pub fn chat_completions_url(&self) -> Result<Url, ProviderError> {
        let raw = format!("{}/chat/completions", self.base_url().trim_end_matches('/'));
        Url::parse(&raw).map_err(|e| ProviderError::InvalidBaseUrl {
            url: self.base_url().to_string(),
            reason: e.to_string(),
        })
    }

    /// Check the config is usable for requests.
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.api_key.is_none() {
            return Err(ProviderError::MissingApiKey("OPENAI_API_KEY"));
        }
        if self.model.trim().is_empty() {
            return Err(ProviderError::MissingConfig("model".to_string()));
        }
        self.chat_completions_url()?;
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    prefix: &str,
    name: &str,
    value: Option<String>,
) -> Result<Option<T>, ProviderError> {
    value
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| ProviderError::InvalidValue {
                key: format!("{}_{}", prefix, name),
                value: raw,
            })
        })
        .transpose()
}

/// Provider error types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Missing API key.
    #[error("Missing API key: {0}")]
    MissingApiKey(&'static str),

    /// Missing required configuration.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Unparseable environment value.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
    },

    /// Base URL does not form a valid endpoint.
    #[error("Invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// Configured base URL.
        url: String,
        /// Parser message.
        reason: String,
    },
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
    fn test_provider_config_builder() {
        let config = ProviderConfig::new()
            .with_api_key("sk-test")
            .with_base_url("https://api.example.com")
            .with_organization("org-123")
            .with_model("gpt-4o");

        assert_eq!(config.api_key, Some("sk-test".to_string()));
        assert_eq!(config.base_url(), "https://api.example.com");
        assert_eq!(config.organization, Some("org-123".to_string()));
        assert_eq!(config.model, "gpt-4o");
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_tokens, 2000);
    }

    #[test]
    fn test_from_lookup() {
        let config = ProviderConfig::from_lookup(
            "OPENAI",
            lookup(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("OPENAI_BASE_URL", "http://localhost:8089/v1"),
                ("OPENAI_TEMPERATURE", "0.2"),
                ("OPENAI_MAX_TOKENS", "512"),
                ("OPENAI_ORGANIZATION", "  "),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.base_url(), "http://localhost:8089/v1");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.organization, None);
        assert_eq!(config.model, "gpt-4");
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = ProviderConfig::from_lookup("OPENAI", lookup(&[("OPENAI_MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidValue { ref key, .. } if key == "OPENAI_MAX_TOKENS"));
    }

    #[test]
    fn test_chat_completions_url() {
        let config = ProviderConfig::new().with_base_url("https://api.example.com/v1/");
        assert_eq!(
            config.chat_completions_url().unwrap().as_str(),
            "https://api.example.com/v1/chat/completions"
        );

        let bad = ProviderConfig::new().with_base_url("not a url");
        assert!(matches!(
            bad.chat_completions_url(),
            Err(ProviderError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            ProviderConfig::new().validate(),
            Err(ProviderError::MissingApiKey("OPENAI_API_KEY"))
        );
        assert!(ProviderConfig::new().with_api_key("sk").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::new().with_api_key("sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
