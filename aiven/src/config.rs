//! Provider configuration. Explicit values win over environment variables.

use crate::api::{ClientConfig, RetryConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.aiven.io";
pub const ENV_API_TOKEN: &str = "AIVEN_TOKEN";
pub const ENV_BASE_URL: &str = "AIVEN_WEB_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("api_token is required (set in provider config or AIVEN_TOKEN env var)")]
    MissingToken,

    #[error("invalid base URL {0}")]
    InvalidBaseUrl(String),
}

/// Values as given in the provider block. Unset fields fall back to the
/// environment, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_token: Option<String>,
    pub base_url: Option<String>,
    pub retry: Option<RetryConfig>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_token: String,
    pub base_url: String,
    pub client: ClientConfig,
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(ProviderSettings::default())
    }

    pub fn resolve(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let api_token = settings
            .api_token
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(ENV_API_TOKEN).ok().filter(|t| !t.is_empty()))
            .ok_or(ConfigError::MissingToken)?;

        let base_url = settings
            .base_url
            .filter(|u| !u.is_empty())
            .or_else(|| std::env::var(ENV_BASE_URL).ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        let client = ClientConfig {
            retry: settings.retry.unwrap_or_default(),
            insecure: settings.insecure,
            ..Default::default()
        };

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }
}
