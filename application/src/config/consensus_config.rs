//! Consensus configuration container.
//!
//! [`ConsensusConfig`] groups everything the job manager needs at startup:
//! who drafts, who arbitrates, how each call is executed, and how long
//! finished jobs are kept.

use crate::config::ExecutionParams;
use consensus_domain::ModelDescriptor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retention of finished jobs in the in-memory store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Terminal jobs older than this are purged.
    pub ttl: Duration,
    /// Upper bound on stored jobs; oldest terminal jobs are evicted first.
    pub max_jobs: usize,
    /// How often the background reaper runs.
    pub reap_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_jobs: 1000,
            reap_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Ordered drafting panel (Phase 1 and Phase 2 participants).
    pub drafting: Vec<ModelDescriptor>,
    /// Single arbiter for Phase 3.
    pub arbiter: ModelDescriptor,
    pub execution: ExecutionParams,
    pub retention: RetentionPolicy,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            drafting: ModelDescriptor::default_drafting(),
            arbiter: ModelDescriptor::default_arbiter(),
            execution: ExecutionParams::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl ConsensusConfig {
    pub fn new(drafting: Vec<ModelDescriptor>, arbiter: ModelDescriptor) -> Self {
        Self {
            drafting,
            arbiter,
            ..Default::default()
        }
    }

    pub fn with_execution(mut self, execution: ExecutionParams) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }
}
