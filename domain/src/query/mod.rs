//! Canonical query types shared by every provider.
//!
//! - [`QueryRequest`] - one prompt for one provider + model
//! - [`QueryResult`] - success with content and usage, or a typed failure
//! - [`TokenUsage`] - vendor-neutral token counts

mod value_objects;

pub use value_objects::{FailureReason, QueryOptions, QueryRequest, QueryResult, TokenUsage};
