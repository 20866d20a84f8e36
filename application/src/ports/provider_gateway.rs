//! Provider Gateway port
//!
//! Defines the interface the pipeline uses to reach text-generation vendors.

use async_trait::async_trait;
use consensus_domain::{FailureReason, ProviderId, QueryRequest, TokenUsage};
use thiserror::Error;

/// Canonical content + usage returned by any vendor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    pub content: String,
    pub usage: TokenUsage,
}

impl RawCompletion {
    pub fn new(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage,
        }
    }
}

/// A single failed provider call (transport, auth, rate limit, payload...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{provider_id} {kind} error{}: {message}", .status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
pub struct ProviderError {
    pub provider_id: ProviderId,
    pub status_code: Option<u16>,
    pub kind: FailureReason,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider_id: ProviderId, kind: FailureReason, message: impl Into<String>) -> Self {
        Self {
            provider_id,
            status_code: None,
            kind,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(provider_id: ProviderId, status: u16, body: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => FailureReason::Auth,
            429 => FailureReason::RateLimited,
            408 | 504 => FailureReason::Timeout,
            _ => FailureReason::Upstream,
        };
        Self {
            provider_id,
            status_code: Some(status),
            kind,
            message: body.into(),
        }
    }

    pub fn malformed(provider_id: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider_id, FailureReason::MalformedResponse, message)
    }

    pub fn transport(provider_id: ProviderId, message: impl Into<String>) -> Self {
        Self::new(provider_id, FailureReason::Transport, message)
    }

    pub fn unknown_provider(provider_id: ProviderId) -> Self {
        Self::new(
            provider_id,
            FailureReason::UnknownProvider,
            format!("no adapter registered for provider '{}'", provider_id),
        )
    }
}

/// Gateway to the registered provider adapters
///
/// Implementations (adapters) live in the infrastructure layer. No retries
/// happen behind this port.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Execute one request against its provider + model
    async fn execute_raw(&self, request: &QueryRequest) -> Result<RawCompletion, ProviderError>;

    /// Providers with a registered adapter
    fn providers(&self) -> Vec<ProviderId>;
}
