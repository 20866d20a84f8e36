//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod execute_query;
pub mod fan_out;
pub mod job_manager;
pub mod run_consensus;
