//! Application layer for consensus-engine
//!
//! This crate contains use cases, port definitions, job bookkeeping and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod jobs;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{ConsensusConfig, ExecutionParams, RetentionPolicy};
pub use jobs::{JobError, JobStore};
pub use ports::{
    progress::{NoProgress, ProgressNotifier},
    provider_gateway::{ProviderError, ProviderGateway, RawCompletion},
    usage_ledger::{ModelUsage, NoUsageLedger, UsageLedger, UsageReport},
};
pub use use_cases::execute_query::QueryExecutor;
pub use use_cases::fan_out::FanOutCoordinator;
pub use use_cases::job_manager::JobManager;
pub use use_cases::run_consensus::{RunConsensusError, RunConsensusInput, RunConsensusUseCase};
