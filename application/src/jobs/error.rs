use consensus_domain::{JobId, JobStateError, ValidationError};
use thiserror::Error;

/// Errors surfaced by the job manager
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] JobStateError),
}
