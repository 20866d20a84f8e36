//! Orchestration domain.
//!
//! - [`entities::Phase`] / [`entities::PipelineState`] - the pipeline state machine
//! - [`value_objects`] - per-phase records and the final [`value_objects::ConsensusResult`]
//! - [`confidence`] - completion-based confidence scoring

pub mod confidence;
pub mod entities;
pub mod value_objects;
