//! OpenAI-compatible client configuration.
//!
//! Any provider exposing the OpenAI wire format works here, e.g. Gemini via
//! `https://generativelanguage.googleapis.com/v1beta/openai`.

use crate::config::ProviderSettings;
use crate::error::{HelperError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured provider.
///
/// The API key is read from the environment variable named in
/// `provider.api_key_env`.
pub fn create_client(provider: &ProviderSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(provider.timeout_secs))
        .build()?;

    let mut config = OpenAIConfig::new();
    if let Some(key) = provider.api_key() {
        config = config.with_api_key(key);
    }
    if let Some(base) = provider.api_base.as_deref().filter(|b| !b.is_empty()) {
        url::Url::parse(base)
            .map_err(|e| HelperError::Config(format!("Invalid provider.api_base '{}': {}", base, e)))?;
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
