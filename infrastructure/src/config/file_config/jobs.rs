//! Job retention settings from TOML (`[jobs]` section)

use super::issues::{ConfigIssue, ConfigIssueCode};
use consensus_application::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileJobsConfig {
    /// Seconds a finished job stays pollable
    pub retention_secs: u64,
    /// Upper bound on stored jobs
    pub max_jobs: usize,
    /// Seconds between retention sweeps
    pub reap_interval_secs: u64,
}

impl Default for FileJobsConfig {
    fn default() -> Self {
        let policy = RetentionPolicy::default();
        Self {
            retention_secs: policy.ttl.as_secs(),
            max_jobs: policy.max_jobs,
            reap_interval_secs: policy.reap_interval.as_secs(),
        }
    }
}

impl FileJobsConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.max_jobs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroValue {
                    field: "jobs.max_jobs".to_string(),
                },
                "jobs.max_jobs must be greater than zero",
            ));
        }
        if self.reap_interval_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroValue {
                    field: "jobs.reap_interval_secs".to_string(),
                },
                "jobs.reap_interval_secs is 0, using 1",
            ));
        }
        issues
    }

    pub fn to_retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            ttl: Duration::from_secs(self.retention_secs),
            max_jobs: self.max_jobs,
            reap_interval: Duration::from_secs(self.reap_interval_secs.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_policy() {
        assert_eq!(
            FileJobsConfig::default().to_retention_policy(),
            RetentionPolicy::default()
        );
    }

    #[test]
    fn test_zero_reap_interval_is_clamped() {
        let config = FileJobsConfig {
            reap_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().len(), 1);
        assert_eq!(
            config.to_retention_policy().reap_interval,
            Duration::from_secs(1)
        );
    }
}
