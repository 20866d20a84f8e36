//! Fan-out Coordinator
//!
//! Runs a batch of independent queries concurrently with settle-all
//! semantics. Results are index-aligned with the requests regardless of
//! completion order.

use crate::ports::provider_gateway::ProviderGateway;
use crate::use_cases::execute_query::QueryExecutor;
use consensus_domain::{FailureReason, QueryRequest, QueryResult};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct FanOutCoordinator<G: ProviderGateway + 'static> {
    executor: QueryExecutor<G>,
}

impl<G: ProviderGateway + 'static> FanOutCoordinator<G> {
    pub fn new(executor: QueryExecutor<G>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &QueryExecutor<G> {
        &self.executor
    }

    /// Execute every request concurrently and wait for all of them.
    ///
    /// A task that panics leaves `Failure { Internal }` in its slot.
    pub async fn run_parallel(
        &self,
        requests: Vec<QueryRequest>,
        cancel: &CancellationToken,
    ) -> Vec<QueryResult> {
        let mut results: Vec<QueryResult> = (0..requests.len())
            .map(|_| QueryResult::failure(FailureReason::Internal, "query task did not complete"))
            .collect();

        let mut join_set = JoinSet::new();
        for (index, request) in requests.into_iter().enumerate() {
            let executor = self.executor.clone();
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let result = executor.execute_query(&request, &cancel).await;
                (index, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = result,
                Err(e) => warn!("Query task join error: {}", e),
            }
        }

        results
    }

    /// Execute one request on its own task.
    ///
    /// A panic becomes `Failure { Internal }` instead of unwinding into the caller.
    pub async fn run_isolated(&self, request: QueryRequest, cancel: &CancellationToken) -> QueryResult {
        let executor = self.executor.clone();
        let cancel = cancel.clone();
        let task = tokio::spawn(async move { executor.execute_query(&request, &cancel).await });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Query task join error: {}", e);
                QueryResult::failure(FailureReason::Internal, "query task did not complete")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedGateway};
    use consensus_domain::{ModelDescriptor, ProviderId, QueryOptions};
    use std::sync::Arc;
    use std::time::Duration;

    fn request(model: &str) -> QueryRequest {
        let model = ModelDescriptor::new(ProviderId::OpenAi, model);
        QueryRequest::new(&model, "prompt", QueryOptions::default())
    }

    #[tokio::test]
    async fn test_preserves_input_order_with_failure() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_any("a", Script::ok_with("resA").delayed(Duration::from_millis(60)))
                .with_any(
                    "b",
                    Script::fail(FailureReason::Upstream).delayed(Duration::from_millis(30)),
                )
                .with_any("c", Script::ok_with("resC")),
        );
        let fan_out = FanOutCoordinator::new(QueryExecutor::new(gateway));

        let results = fan_out
            .run_parallel(
                vec![request("a"), request("b"), request("c")],
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(results.len(), 3);
        assert!(matches!(&results[0], QueryResult::Success { content, .. } if content == "resA"));
        assert_eq!(results[1].failure_reason(), Some(FailureReason::Upstream));
        assert!(matches!(&results[2], QueryResult::Success { content, .. } if content == "resC"));
    }

    #[tokio::test]
    async fn test_runs_concurrently() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_any("a", Script::ok().delayed(Duration::from_millis(200)))
                .with_any("b", Script::ok().delayed(Duration::from_millis(200)))
                .with_any("c", Script::ok().delayed(Duration::from_millis(200))),
        );
        let fan_out = FanOutCoordinator::new(QueryExecutor::new(gateway));

        let started = std::time::Instant::now();
        let results = fan_out
            .run_parallel(
                vec![request("a"), request("b"), request("c")],
                &CancellationToken::new(),
            )
            .await;

        assert!(results.iter().all(|r| r.is_success()));
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let fan_out = FanOutCoordinator::new(QueryExecutor::new(Arc::new(ScriptedGateway::new())));
        let results = fan_out.run_parallel(vec![], &CancellationToken::new()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_isolated_panic_becomes_internal_failure() {
        let gateway = Arc::new(ScriptedGateway::new().with_any("a", Script::panic()));
        let coordinator = FanOutCoordinator::new(QueryExecutor::new(gateway));

        let result = coordinator
            .run_isolated(request("a"), &CancellationToken::new())
            .await;
        assert_eq!(result.failure_reason(), Some(FailureReason::Internal));

        let result = coordinator
            .run_isolated(request("b"), &CancellationToken::new())
            .await;
        assert!(result.is_success());
    }
}
