//! Model panel configuration from TOML (`[models]` section)

use super::issues::{ConfigIssue, ConfigIssueCode};
use consensus_domain::{ModelDescriptor, ValidationError};
use serde::{Deserialize, Serialize};

/// Drafting panel and arbiter, as `provider:model[@Display Name]` specs
///
/// # Example
///
/// ```toml
/// [models]
/// drafting = ["openai:gpt-4o", "anthropic:claude-sonnet-4-5", "gemini:gemini-2.5-pro"]
/// arbiter = "anthropic:claude-sonnet-4-5@Claude Arbiter"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Ordered drafting models (built-in panel when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drafting: Option<Vec<String>>,
    /// Arbiter model (built-in arbiter when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arbiter: Option<String>,
}

impl FileModelsConfig {
    fn parse_spec(field: &str, spec: &str) -> Result<ModelDescriptor, ConfigIssue> {
        spec.parse::<ModelDescriptor>().map_err(|e| {
            let value = spec.to_string();
            let code = match e {
                ValidationError::UnknownProvider(_) => ConfigIssueCode::UnknownProvider {
                    field: field.to_string(),
                    value,
                },
                _ => ConfigIssueCode::InvalidModelSpec {
                    field: field.to_string(),
                    value,
                },
            };
            ConfigIssue::error(code, format!("models.{}: {}", field, e))
        })
    }

    /// Parse the drafting panel, collecting issues for bad entries.
    pub fn parse_drafting(&self) -> (Vec<ModelDescriptor>, Vec<ConfigIssue>) {
        let Some(specs) = &self.drafting else {
            return (ModelDescriptor::default_drafting(), Vec::new());
        };

        let mut issues = Vec::new();
        if specs.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModelList {
                    field: "drafting".to_string(),
                },
                "models.drafting: at least one drafting model is required",
            ));
        }

        let mut models = Vec::new();
        for spec in specs {
            match Self::parse_spec("drafting", spec) {
                Ok(model) => models.push(model),
                Err(issue) => issues.push(issue),
            }
        }
        (models, issues)
    }

    /// Parse the arbiter spec
    pub fn parse_arbiter(&self) -> (ModelDescriptor, Vec<ConfigIssue>) {
        match &self.arbiter {
            None => (ModelDescriptor::default_arbiter(), Vec::new()),
            Some(spec) => match Self::parse_spec("arbiter", spec) {
                Ok(model) => (model, Vec::new()),
                Err(issue) => (ModelDescriptor::default_arbiter(), vec![issue]),
            },
        }
    }
}
