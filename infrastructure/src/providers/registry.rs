use super::ProviderAdapter;
use async_trait::async_trait;
use consensus_application::{ProviderError, ProviderGateway, RawCompletion};
use consensus_domain::{ProviderId, QueryRequest};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Routes each request to the adapter registered for its provider id.
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: BTreeMap<ProviderId, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one for the same provider
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.provider_id(), adapter);
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    fn resolve(&self, provider_id: ProviderId) -> Result<&dyn ProviderAdapter, ProviderError> {
        self.adapters
            .get(&provider_id)
            .map(|a| a.as_ref())
            .ok_or_else(|| ProviderError::unknown_provider(provider_id))
    }
}

#[async_trait]
impl ProviderGateway for ProviderRegistry {
    async fn execute_raw(&self, request: &QueryRequest) -> Result<RawCompletion, ProviderError> {
        let adapter = self.resolve(request.provider_id)?;
        debug!(
            provider = %request.provider_id,
            model = %request.model_id,
            prompt_chars = request.prompt.len(),
            "Dispatching provider call"
        );
        adapter
            .complete(&request.model_id, &request.prompt, &request.options)
            .await
    }

    fn providers(&self) -> Vec<ProviderId> {
        self.adapters.keys().copied().collect()
    }
}
