//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelDescriptor`] - a provider + model participant
//! - [`topic::ConsensusRequest`] - a validated topic with its sources and options
//! - [`error::ValidationError`] - input rejected before a job exists

pub mod error;
pub mod model;
pub mod topic;
