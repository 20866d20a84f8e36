//! Domain error types

use thiserror::Error;

/// Rejected input, raised before any job is created
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Topic must be at least {min} characters (got {actual})")]
    TopicTooShort { min: usize, actual: usize },

    #[error("Topic must be at most {max} characters (got {actual})")]
    TopicTooLong { max: usize, actual: usize },

    #[error("At most {max} sources are allowed (got {actual})")]
    TooManySources { max: usize, actual: usize },

    #[error("Source #{index} exceeds {max} characters (got {actual})")]
    SourceTooLong {
        index: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid model spec '{0}' (expected provider:model)")]
    InvalidModelSpec(String),
}
