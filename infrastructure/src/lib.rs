//! Infrastructure layer for consensus-engine
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: vendor HTTP adapters behind the provider
//! gateway, the JSONL usage ledger, and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use logging::JsonlUsageLedger;
pub use providers::{
    AnthropicAdapter, GeminiAdapter, OpenAiAdapter, ProviderAdapter, ProviderRegistry,
};
