//! Provider credentials and endpoints from TOML (`[providers]` section)
//!
//! ```toml
//! [providers.openai]
//! api_key_env = "OPENAI_API_KEY"
//! base_url = "https://api.openai.com"
//!
//! [providers.anthropic]
//! api_version = "2023-06-01"
//! ```

use crate::providers::{AnthropicAdapter, GeminiAdapter, OpenAiAdapter, ProviderRegistry, anthropic, gemini, openai};
use consensus_application::ProviderGateway;
use consensus_domain::ProviderId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Direct key first, then the named environment variable
fn resolve_api_key(api_key: &Option<String>, api_key_env: &str) -> Option<String> {
    api_key
        .clone()
        .or_else(|| std::env::var(api_key_env).ok())
        .filter(|key| !key.trim().is_empty())
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL (can point at any compatible endpoint).
    pub base_url: String,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: openai::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: anthropic::DEFAULT_BASE_URL.to_string(),
            api_version: anthropic::DEFAULT_API_VERSION.to_string(),
        }
    }
}

/// Gemini API provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeminiConfig {
    /// Environment variable name for the API key (default: "GEMINI_API_KEY").
    pub api_key_env: String,
    /// Direct API key. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL for the Generative Language API.
    pub base_url: String,
}

impl Default for FileGeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileOpenAiConfig,
    pub anthropic: FileAnthropicConfig,
    pub gemini: FileGeminiConfig,
}

impl FileProvidersConfig {
    /// Build a registry holding an adapter for every provider with a usable key.
    ///
    /// Providers without a key are left out; calls to their models fail with
    /// `UnknownProvider`. All adapters share one connection pool.
    pub fn build_registry(&self) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        let client = reqwest::Client::new();

        match resolve_api_key(&self.openai.api_key, &self.openai.api_key_env) {
            Some(key) => registry.register(Arc::new(
                OpenAiAdapter::new(key)
                    .with_client(client.clone())
                    .with_base_url(&self.openai.base_url),
            )),
            None => Self::log_missing(ProviderId::OpenAi, &self.openai.api_key_env),
        }

        match resolve_api_key(&self.anthropic.api_key, &self.anthropic.api_key_env) {
            Some(key) => registry.register(Arc::new(
                AnthropicAdapter::new(key)
                    .with_client(client.clone())
                    .with_base_url(&self.anthropic.base_url)
                    .with_api_version(&self.anthropic.api_version),
            )),
            None => Self::log_missing(ProviderId::Anthropic, &self.anthropic.api_key_env),
        }

        match resolve_api_key(&self.gemini.api_key, &self.gemini.api_key_env) {
            Some(key) => registry.register(Arc::new(
                GeminiAdapter::new(key)
                    .with_client(client)
                    .with_base_url(&self.gemini.base_url),
            )),
            None => Self::log_missing(ProviderId::Gemini, &self.gemini.api_key_env),
        }

        debug!(providers = ?registry.providers(), "Provider registry built");
        registry
    }

    fn log_missing(provider_id: ProviderId, env: &str) {
        warn!(provider = %provider_id, "No API key found (set {} or providers.{}.api_key)", env, provider_id);
    }
}
