//! Domain layer for the consensus engine
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! A consensus job fans a topic out to several drafting models, has every
//! successful drafter critique every other successful draft, then asks a
//! single arbiter to synthesize the final report:
//!
//! 1. **Drafting** - independent answers, run concurrently
//! 2. **Peer Review** - `k · (k − 1)` ordered critiques, run sequentially
//! 3. **Arbitration** - one synthesis; its failure fails the job
//!
//! A [`Job`] tracks the run for polling clients; the finished
//! [`ConsensusResult`] carries a completion-based confidence score.

pub mod core;
pub mod job;
pub mod orchestration;
pub mod prompt;
pub mod query;

// Re-export commonly used types
pub use core::{
    error::ValidationError,
    model::{ModelDescriptor, ProviderId},
    topic::{ConsensusRequest, JobOptions, Priority, Topic},
};
pub use job::{
    Job, JobId, JobPhase, JobStateError, JobStatus, PhaseSpan, PhaseTimestamps, milestones,
};
pub use orchestration::{
    confidence::{MAX_CONFIDENCE, MIN_CONFIDENCE, PhaseOutcome, confidence_score},
    entities::{Phase, PipelineState},
    value_objects::{
        ArbitrationRecord, ConsensusMetadata, ConsensusResult, DraftRecord, ReviewRecord,
    },
};
pub use prompt::PromptTemplate;
pub use query::{FailureReason, QueryOptions, QueryRequest, QueryResult, TokenUsage};
