//! Query Executor
//!
//! Runs one canonical request against one provider + model and never
//! returns an error: timeouts, cancellation and provider failures all become
//! [`QueryResult::Failure`].

use crate::ports::provider_gateway::ProviderGateway;
use consensus_domain::{FailureReason, QueryRequest, QueryResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct QueryExecutor<G: ProviderGateway + 'static> {
    gateway: Arc<G>,
}

impl<G: ProviderGateway + 'static> Clone for QueryExecutor<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G: ProviderGateway + 'static> QueryExecutor<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Execute with the request's own timeout.
    ///
    /// Cancellation is checked before dispatch and raced against the call.
    pub async fn execute_query(
        &self,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> QueryResult {
        if cancel.is_cancelled() {
            return QueryResult::failure(FailureReason::Cancelled, "job cancelled before dispatch");
        }

        let timeout = request.timeout();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                return QueryResult::failure(FailureReason::Cancelled, "job cancelled during call");
            }
            outcome = tokio::time::timeout(timeout, self.gateway.execute_raw(request)) => outcome,
        };

        let result = match outcome {
            Ok(Ok(completion)) => QueryResult::success(completion.content, completion.usage),
            Ok(Err(e)) => QueryResult::failure(e.kind, e.to_string()),
            Err(_) => QueryResult::failure(
                FailureReason::Timeout,
                format!("no response within {}ms", timeout.as_millis()),
            ),
        };

        match &result {
            QueryResult::Success { usage, .. } => debug!(
                provider = %request.provider_id,
                model = %request.model_id,
                tokens = usage.total_tokens,
                "Query succeeded"
            ),
            QueryResult::Failure { reason, message } => warn!(
                provider = %request.provider_id,
                model = %request.model_id,
                %reason,
                "Query failed: {}",
                message
            ),
        }

        result
    }
}
