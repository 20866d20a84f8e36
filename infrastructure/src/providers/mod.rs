//! Vendor adapters behind the [`ProviderGateway`](consensus_application::ProviderGateway) port.
//!
//! Each adapter translates the canonical request into one vendor's HTTP API
//! and normalizes the answer into content + [`TokenUsage`](consensus_domain::TokenUsage).

pub mod anthropic;
pub mod gemini;
mod http;
pub mod openai;
pub mod registry;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use registry::ProviderRegistry;

use async_trait::async_trait;
use consensus_application::{ProviderError, RawCompletion};
use consensus_domain::{ProviderId, QueryOptions};

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider_id(&self) -> ProviderId;

    /// One completion call. No retries.
    async fn complete(
        &self,
        model_id: &str,
        prompt: &str,
        options: &QueryOptions,
    ) -> Result<RawCompletion, ProviderError>;
}
