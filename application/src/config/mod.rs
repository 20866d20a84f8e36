//! Application-level configuration.
//!
//! - [`ExecutionParams`] - per-call timeout, token cap, temperature, draft threshold
//! - [`ConsensusConfig`] - drafting panel, arbiter, execution and retention

pub mod consensus_config;
pub mod execution_params;

pub use consensus_config::{ConsensusConfig, RetentionPolicy};
pub use execution_params::ExecutionParams;
