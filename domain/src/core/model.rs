//! Model value objects: provider identity and model descriptors

use crate::core::error::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text-generation vendor (Value Object)
///
/// Each variant selects exactly one provider adapter. Adapters are
/// registered against this tag at startup, so dispatch never inspects
/// response shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderId {
    /// All known providers, in registration order
    pub const ALL: [ProviderId; 3] = [ProviderId::OpenAi, ProviderId::Anthropic, ProviderId::Gemini];

    /// Get the string identifier for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            "anthropic" => Ok(ProviderId::Anthropic),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            other => Err(ValidationError::UnknownProvider(other.to_string())),
        }
    }
}

impl Serialize for ProviderId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One participant in a consensus run (Value Object)
///
/// Identifies a provider + model pair. Configured at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub provider_id: ProviderId,
    pub model_id: String,
    pub display_name: String,
}

impl ModelDescriptor {
    /// Create a descriptor whose display name is `provider/model`
    pub fn new(provider_id: ProviderId, model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        Self {
            display_name: format!("{}/{}", provider_id, model_id),
            provider_id,
            model_id,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Default drafting panel: one model per vendor
    pub fn default_drafting() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new(ProviderId::OpenAi, "gpt-4o").with_display_name("GPT-4o"),
            ModelDescriptor::new(ProviderId::Anthropic, "claude-sonnet-4-5")
                .with_display_name("Claude Sonnet 4.5"),
            ModelDescriptor::new(ProviderId::Gemini, "gemini-2.5-pro")
                .with_display_name("Gemini 2.5 Pro"),
        ]
    }

    /// Default arbiter
    pub fn default_arbiter() -> ModelDescriptor {
        ModelDescriptor::new(ProviderId::Anthropic, "claude-sonnet-4-5")
            .with_display_name("Claude Sonnet 4.5")
    }
}

impl std::fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// Parses `provider:model` or `provider:model@Display Name`.
impl std::str::FromStr for ModelDescriptor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (spec, display) = match s.split_once('@') {
            Some((spec, name)) => (spec, Some(name.trim())),
            None => (s, None),
        };
        let (provider, model) = spec
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidModelSpec(s.to_string()))?;
        let model = model.trim();
        if model.is_empty() {
            return Err(ValidationError::InvalidModelSpec(s.to_string()));
        }

        let descriptor = ModelDescriptor::new(provider.parse()?, model);
        Ok(match display {
            Some(name) if !name.is_empty() => descriptor.with_display_name(name),
            _ => descriptor,
        })
    }
}
