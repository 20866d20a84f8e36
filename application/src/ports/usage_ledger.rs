//! Port for reporting token usage to an external ledger.
//!
//! The core only reports counts; quota and billing arithmetic belong to the
//! collaborator behind this port.

use chrono::{DateTime, Utc};
use consensus_domain::{ConsensusResult, JobId, ModelDescriptor, TokenUsage};
use serde::Serialize;
use std::collections::BTreeMap;

/// Usage attributed to one model across all of its calls in a job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelUsage {
    pub model: ModelDescriptor,
    pub calls: usize,
    pub usage: TokenUsage,
}

/// Token totals for one completed job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    pub job_id: JobId,
    pub total: TokenUsage,
    pub per_model: Vec<ModelUsage>,
    pub completed_at: DateTime<Utc>,
}

impl UsageReport {
    pub fn from_result(job_id: JobId, result: &ConsensusResult) -> Self {
        let mut per_model: BTreeMap<String, ModelUsage> = BTreeMap::new();
        let mut add = |model: &ModelDescriptor, usage: TokenUsage| {
            let key = format!("{}:{}", model.provider_id, model.model_id);
            let entry = per_model.entry(key).or_insert_with(|| ModelUsage {
                model: model.clone(),
                calls: 0,
                usage: TokenUsage::default(),
            });
            entry.calls += 1;
            entry.usage += usage;
        };

        for draft in &result.drafts {
            add(&draft.model, draft.token_usage);
        }
        for review in &result.reviews {
            add(&review.reviewer, review.token_usage);
        }
        add(&result.arbitration.arbiter, result.arbitration.token_usage);

        Self {
            job_id,
            total: result.total_tokens,
            per_model: per_model.into_values().collect(),
            completed_at: result.metadata.completed_at,
        }
    }
}

/// Port for recording usage reports.
///
/// `record` is synchronous and non-fallible; ledger problems never fail a
/// job. The job manager calls it on the blocking thread pool, so
/// implementations may do file or network I/O.
pub trait UsageLedger: Send + Sync {
    fn record(&self, report: UsageReport);
}

/// No-op implementation for tests and when no ledger is configured.
pub struct NoUsageLedger;

impl UsageLedger for NoUsageLedger {
    fn record(&self, _report: UsageReport) {}
}
