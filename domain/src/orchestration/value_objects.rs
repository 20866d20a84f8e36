//! Orchestration value objects - immutable records produced by each phase.
//!
//! - [`DraftRecord`] - one drafting model's answer (Phase 1)
//! - [`ReviewRecord`] - one model's critique of another's draft (Phase 2)
//! - [`ArbitrationRecord`] - the arbiter's synthesis (Phase 3)
//! - [`ConsensusResult`] - everything above plus the derived confidence

use crate::core::model::ModelDescriptor;
use crate::orchestration::confidence::{PhaseOutcome, confidence_score};
use crate::query::{QueryResult, TokenUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Split a query result into (content, usage, succeeded, error).
fn unpack(result: QueryResult) -> (String, TokenUsage, bool, Option<String>) {
    match result {
        QueryResult::Success { content, usage } => (content, usage, true, None),
        QueryResult::Failure { reason, message } => (
            String::new(),
            TokenUsage::default(),
            false,
            Some(format!("{}: {}", reason, message)),
        ),
    }
}

/// First-pass answer from one drafting model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub model: ModelDescriptor,
    pub content: String,
    pub token_usage: TokenUsage,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DraftRecord {
    pub fn from_result(model: ModelDescriptor, result: QueryResult) -> Self {
        let (content, token_usage, succeeded, error) = unpack(result);
        Self {
            model,
            content,
            token_usage,
            succeeded,
            error,
        }
    }
}

/// Critique of `reviewed_model`'s draft written by `reviewer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewer: ModelDescriptor,
    pub reviewed_model: ModelDescriptor,
    pub content: String,
    pub token_usage: TokenUsage,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewRecord {
    pub fn from_result(
        reviewer: ModelDescriptor,
        reviewed_model: ModelDescriptor,
        result: QueryResult,
    ) -> Self {
        let (content, token_usage, succeeded, error) = unpack(result);
        Self {
            reviewer,
            reviewed_model,
            content,
            token_usage,
            succeeded,
            error,
        }
    }
}

/// The arbiter's final synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationRecord {
    pub arbiter: ModelDescriptor,
    pub content: String,
    pub token_usage: TokenUsage,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArbitrationRecord {
    pub fn from_result(arbiter: ModelDescriptor, result: QueryResult) -> Self {
        let (content, token_usage, succeeded, error) = unpack(result);
        Self {
            arbiter,
            content,
            token_usage,
            succeeded,
            error,
        }
    }
}

/// Descriptive facts about a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusMetadata {
    pub topic: String,
    pub source_count: usize,
    pub drafting_models: Vec<ModelDescriptor>,
    pub arbiter: ModelDescriptor,
    pub successful_drafts: usize,
    pub successful_reviews: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Complete result of a consensus job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub final_text: String,
    pub confidence: f64,
    pub total_tokens: TokenUsage,
    pub drafts: Vec<DraftRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub arbitration: ArbitrationRecord,
    pub metadata: ConsensusMetadata,
}

impl ConsensusResult {
    /// Assemble the result, deriving total usage and confidence from the records.
    pub fn assemble(
        topic: impl Into<String>,
        source_count: usize,
        drafts: Vec<DraftRecord>,
        reviews: Vec<ReviewRecord>,
        arbitration: ArbitrationRecord,
        started_at: DateTime<Utc>,
    ) -> Self {
        let completed_at = Utc::now();
        let outcome = PhaseOutcome {
            drafting_models: drafts.len(),
            successful_drafts: drafts.iter().filter(|d| d.succeeded).count(),
            successful_reviews: reviews.iter().filter(|r| r.succeeded).count(),
            arbitration_succeeded: arbitration.succeeded,
        };

        let total_tokens = drafts.iter().map(|d| d.token_usage).sum::<TokenUsage>()
            + reviews.iter().map(|r| r.token_usage).sum::<TokenUsage>()
            + arbitration.token_usage;

        let metadata = ConsensusMetadata {
            topic: topic.into(),
            source_count,
            drafting_models: drafts.iter().map(|d| d.model.clone()).collect(),
            arbiter: arbitration.arbiter.clone(),
            successful_drafts: outcome.successful_drafts,
            successful_reviews: outcome.successful_reviews,
            started_at,
            completed_at,
            duration_ms: (completed_at - started_at).num_milliseconds().max(0) as u64,
        };

        Self {
            final_text: arbitration.content.clone(),
            confidence: confidence_score(&outcome),
            total_tokens,
            drafts,
            reviews,
            arbitration,
            metadata,
        }
    }

    pub fn successful_drafts(&self) -> impl Iterator<Item = &DraftRecord> {
        self.drafts.iter().filter(|d| d.succeeded)
    }

    pub fn failed_drafts(&self) -> impl Iterator<Item = &DraftRecord> {
        self.drafts.iter().filter(|d| !d.succeeded)
    }
}
