//! Per-call execution settings from TOML (`[execution]` section)

use super::issues::{ConfigIssue, ConfigIssueCode};
use consensus_application::ExecutionParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound accepted for `temperature` across all vendors
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    /// Timeout for each provider call, in seconds
    pub timeout_secs: u64,
    /// Generated-token cap per call
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Successful drafts required before peer review starts
    pub min_successful_drafts: usize,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            timeout_secs: params.call_timeout.as_secs(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            min_successful_drafts: params.min_successful_drafts,
        }
    }
}

impl FileExecutionConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "execution.timeout_secs".to_string(),
                },
                "execution.timeout_secs must be greater than zero",
            ));
        }
        if self.max_tokens == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "execution.max_tokens".to_string(),
                },
                "execution.max_tokens must be greater than zero",
            ));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "execution.temperature".to_string(),
                    value: self.temperature.to_string(),
                },
                format!(
                    "execution.temperature must be within 0.0..={}, got {}",
                    MAX_TEMPERATURE, self.temperature
                ),
            ));
        }
        if self.min_successful_drafts == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroValue {
                    field: "execution.min_successful_drafts".to_string(),
                },
                "execution.min_successful_drafts is 0, using 1",
            ));
        }

        issues
    }

    pub fn to_execution_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_call_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_min_successful_drafts(self.min_successful_drafts)
    }
}
