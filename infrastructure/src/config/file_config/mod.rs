//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! after validation.

mod execution;
mod issues;
mod jobs;
mod ledger;
mod models;
mod providers;

pub use execution::FileExecutionConfig;
pub use issues::{ConfigIssue, ConfigIssueCode, Severity};
pub use jobs::FileJobsConfig;
pub use ledger::FileLedgerConfig;
pub use models::FileModelsConfig;
pub use providers::{FileAnthropicConfig, FileGeminiConfig, FileOpenAiConfig, FileProvidersConfig};

use consensus_application::ConsensusConfig;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Drafting panel and arbiter
    pub models: FileModelsConfig,
    /// Per-call execution settings
    pub execution: FileExecutionConfig,
    /// Job retention
    pub jobs: FileJobsConfig,
    /// Vendor credentials and endpoints
    pub providers: FileProvidersConfig,
    /// Usage ledger output
    pub ledger: FileLedgerConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Model specs (empty panel, unknown provider, malformed spec)
    /// 2. Execution and retention values
    /// 3. A draft threshold the panel can never reach
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Model parse validation
        let (drafting, drafting_issues) = self.models.parse_drafting();
        issues.extend(drafting_issues);
        issues.extend(self.models.parse_arbiter().1);

        // 2. Numeric sections
        issues.extend(self.execution.validate());
        issues.extend(self.jobs.validate());

        // 3. Threshold vs panel size
        if !drafting.is_empty() && self.execution.min_successful_drafts > drafting.len() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "execution.min_successful_drafts".to_string(),
                    value: self.execution.min_successful_drafts.to_string(),
                },
                format!(
                    "execution.min_successful_drafts ({}) exceeds the {} configured drafting model(s)",
                    self.execution.min_successful_drafts,
                    drafting.len()
                ),
            ));
        }

        issues
    }

    /// Convert into the application configuration.
    ///
    /// Invalid entries are dropped; call [`validate`](Self::validate) first
    /// to surface them.
    pub fn to_consensus_config(&self) -> ConsensusConfig {
        ConsensusConfig::new(self.models.parse_drafting().0, self.models.parse_arbiter().0)
            .with_execution(self.execution.to_execution_params())
            .with_retention(self.jobs.to_retention_policy())
    }
}
