//! Run Consensus use case
//!
//! Orchestrates the three-phase consensus flow:
//!
//! 1. **Drafting** - every drafting model answers the topic in parallel
//! 2. **Peer Review** - each successful drafter critiques every other successful draft
//! 3. **Arbitration** - the arbiter synthesizes drafts and reviews into the final text

use crate::config::ExecutionParams;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::provider_gateway::ProviderGateway;
use crate::use_cases::execute_query::QueryExecutor;
use crate::use_cases::fan_out::FanOutCoordinator;
use chrono::Utc;
use consensus_domain::{
    ArbitrationRecord, ConsensusRequest, ConsensusResult, DraftRecord, FailureReason,
    ModelDescriptor, Phase, PipelineState, PromptTemplate, QueryRequest, QueryResult,
    ReviewRecord,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fatal pipeline failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunConsensusError {
    #[error("No drafting models configured")]
    NoModels,

    #[error("Drafting failed: {succeeded} successful draft(s), {required} required")]
    NoSuccessfulDrafts { succeeded: usize, required: usize },

    #[error("Arbitration failed: {0}")]
    ArbitrationFailed(String),

    #[error("cancelled")]
    Cancelled,

    #[error("Invalid pipeline transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: PipelineState,
        to: PipelineState,
    },
}

/// Input for the RunConsensus use case
#[derive(Debug, Clone)]
pub struct RunConsensusInput {
    /// The validated topic, sources and options
    pub request: ConsensusRequest,
    /// Ordered drafting models
    pub drafting: Vec<ModelDescriptor>,
    /// The single arbiter
    pub arbiter: ModelDescriptor,
    /// Per-call parameters
    pub params: ExecutionParams,
}

impl RunConsensusInput {
    pub fn new(
        request: ConsensusRequest,
        drafting: Vec<ModelDescriptor>,
        arbiter: ModelDescriptor,
    ) -> Self {
        Self {
            request,
            drafting,
            arbiter,
            params: ExecutionParams::default(),
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }
}

/// Pipeline position, enforced through [`PipelineState::transition`]
struct Pipeline {
    state: PipelineState,
}

impl Pipeline {
    fn new() -> Self {
        Self {
            state: PipelineState::Init,
        }
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), RunConsensusError> {
        self.state = self
            .state
            .transition(next)
            .map_err(|from| RunConsensusError::InvalidTransition { from, to: next })?;
        Ok(())
    }

    /// Move to `Failed` and hand back the error
    fn fail(&mut self, error: RunConsensusError) -> RunConsensusError {
        if let Ok(failed) = self.state.transition(PipelineState::Failed) {
            self.state = failed;
        }
        error
    }
}

/// Use case for running one consensus pipeline
pub struct RunConsensusUseCase<G: ProviderGateway + 'static> {
    fan_out: FanOutCoordinator<G>,
}

impl<G: ProviderGateway + 'static> RunConsensusUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            fan_out: FanOutCoordinator::new(QueryExecutor::new(gateway)),
        }
    }

    fn executor(&self) -> &QueryExecutor<G> {
        self.fan_out.executor()
    }

    /// Execute the use case with default (no-op) progress and no cancellation
    pub async fn execute(
        &self,
        input: RunConsensusInput,
    ) -> Result<ConsensusResult, RunConsensusError> {
        self.execute_with_progress(input, &NoProgress, &CancellationToken::new())
            .await
    }

    /// Execute the use case with progress callbacks and a cancellation token
    pub async fn execute_with_progress(
        &self,
        input: RunConsensusInput,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<ConsensusResult, RunConsensusError> {
        let mut pipeline = Pipeline::new();

        if input.drafting.is_empty() {
            return Err(pipeline.fail(RunConsensusError::NoModels));
        }

        let started_at = Utc::now();
        info!(
            models = input.drafting.len(),
            arbiter = %input.arbiter,
            "Starting consensus run"
        );

        // Phase 1: Drafting
        pipeline.advance(PipelineState::Drafting)?;
        let drafts = self.phase_drafting(&input, progress, cancel).await;
        let succeeded = drafts.iter().filter(|d| d.succeeded).count();
        if cancel.is_cancelled() {
            return Err(pipeline.fail(RunConsensusError::Cancelled));
        }
        let required = input.params.min_successful_drafts.max(1);
        if succeeded < required {
            warn!(succeeded, required, "Drafting produced too few drafts");
            return Err(pipeline.fail(RunConsensusError::NoSuccessfulDrafts {
                succeeded,
                required,
            }));
        }
        progress.on_phase_complete(Phase::Drafting);

        // Phase 2: Peer Review
        pipeline.advance(PipelineState::PeerReview)?;
        let reviews = self.phase_review(&input, &drafts, progress, cancel).await;
        if cancel.is_cancelled() {
            return Err(pipeline.fail(RunConsensusError::Cancelled));
        }
        progress.on_phase_complete(Phase::PeerReview);

        // Phase 3: Arbitration
        pipeline.advance(PipelineState::Arbitration)?;
        let arbitration = self
            .phase_arbitration(&input, &drafts, &reviews, progress, cancel)
            .await;
        if !arbitration.succeeded {
            let message = arbitration.error.clone().unwrap_or_default();
            let error = if cancel.is_cancelled() {
                RunConsensusError::Cancelled
            } else {
                RunConsensusError::ArbitrationFailed(message)
            };
            return Err(pipeline.fail(error));
        }
        progress.on_phase_complete(Phase::Arbitration);

        pipeline.advance(PipelineState::Done)?;
        let result = ConsensusResult::assemble(
            input.request.topic().as_str(),
            input.request.sources().len(),
            drafts,
            reviews,
            arbitration,
            started_at,
        );

        info!(
            confidence = result.confidence,
            tokens = result.total_tokens.total_tokens,
            "Consensus run finished"
        );
        Ok(result)
    }

    /// Phase 1: one shared prompt, fanned out to every drafting model
    async fn phase_drafting(
        &self,
        input: &RunConsensusInput,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Vec<DraftRecord> {
        info!(phase = Phase::Drafting.as_str(), "Phase 1: Drafting");
        progress.on_phase_start(Phase::Drafting, input.drafting.len());

        let max_length = input.request.options().max_response_length;
        let prompt = PromptTemplate::draft_prompt(
            input.request.topic().as_str(),
            input.request.sources(),
            max_length,
        );
        let options = input.params.bounded_query_options(max_length);

        let requests = input
            .drafting
            .iter()
            .map(|model| QueryRequest::new(model, prompt.clone(), options))
            .collect();

        let results = self.fan_out.run_parallel(requests, cancel).await;

        input
            .drafting
            .iter()
            .zip(results)
            .map(|(model, result)| {
                progress.on_task_complete(Phase::Drafting, model, result.is_success());
                DraftRecord::from_result(model.clone(), result)
            })
            .collect()
    }

    /// Phase 2: every ordered (reviewer, reviewed) pair of successful drafts
    ///
    /// Runs sequentially, reviewer outer loop, reviewed inner loop. Each call
    /// runs on its own task so a panic only fails that review.
    async fn phase_review(
        &self,
        input: &RunConsensusInput,
        drafts: &[DraftRecord],
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Vec<ReviewRecord> {
        info!(phase = Phase::PeerReview.as_str(), "Phase 2: Peer Review");

        let successful: Vec<&DraftRecord> = drafts.iter().filter(|d| d.succeeded).collect();
        let k = successful.len();
        progress.on_phase_start(Phase::PeerReview, k * k.saturating_sub(1));

        if k < 2 {
            debug!("Fewer than two successful drafts; no reviews to run");
        }

        let options = input.params.query_options();
        let mut reviews = Vec::with_capacity(k * k.saturating_sub(1));

        for (i, reviewer) in successful.iter().enumerate() {
            for (j, reviewed) in successful.iter().enumerate() {
                if i == j {
                    continue;
                }

                let prompt = PromptTemplate::review_prompt(
                    input.request.topic().as_str(),
                    &reviewed.model.display_name,
                    &reviewed.content,
                );
                let request = QueryRequest::new(&reviewer.model, prompt, options);
                let result = self.fan_out.run_isolated(request, cancel).await;

                if let QueryResult::Failure { reason, .. } = &result {
                    warn!(
                        reviewer = %reviewer.model,
                        reviewed = %reviewed.model,
                        %reason,
                        "Review failed"
                    );
                }
                progress.on_task_complete(Phase::PeerReview, &reviewer.model, result.is_success());
                reviews.push(ReviewRecord::from_result(
                    reviewer.model.clone(),
                    reviewed.model.clone(),
                    result,
                ));
            }
        }

        reviews
    }

    /// Phase 3: the arbiter sees every successful draft and review
    async fn phase_arbitration(
        &self,
        input: &RunConsensusInput,
        drafts: &[DraftRecord],
        reviews: &[ReviewRecord],
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> ArbitrationRecord {
        info!(phase = Phase::Arbitration.as_str(), "Phase 3: Arbitration");
        progress.on_phase_start(Phase::Arbitration, 1);

        let draft_sections: Vec<(String, String)> = drafts
            .iter()
            .filter(|d| d.succeeded)
            .map(|d| (d.model.display_name.clone(), d.content.clone()))
            .collect();
        let review_sections: Vec<(String, String, String)> = reviews
            .iter()
            .filter(|r| r.succeeded)
            .map(|r| {
                (
                    r.reviewer.display_name.clone(),
                    r.reviewed_model.display_name.clone(),
                    r.content.clone(),
                )
            })
            .collect();

        let max_length = input.request.options().max_response_length;
        let prompt = PromptTemplate::arbitration_prompt(
            input.request.topic().as_str(),
            input.request.sources(),
            &draft_sections,
            &review_sections,
            max_length,
        );
        let request = QueryRequest::new(
            &input.arbiter,
            prompt,
            input.params.bounded_query_options(max_length),
        );

        let result = self.executor().execute_query(&request, cancel).await;
        let result = match result {
            QueryResult::Success { content, .. } if content.trim().is_empty() => {
                QueryResult::failure(FailureReason::MalformedResponse, "arbiter returned empty text")
            }
            other => other,
        };
        progress.on_task_complete(Phase::Arbitration, &input.arbiter, result.is_success());

        ArbitrationRecord::from_result(input.arbiter.clone(), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PromptKind, Script, ScriptedGateway};
    use consensus_domain::{JobOptions, ProviderId};
    use std::sync::Mutex;
    use std::time::Duration;

    fn model(id: &str) -> ModelDescriptor {
        ModelDescriptor::new(ProviderId::OpenAi, id).with_display_name(id.to_uppercase())
    }

    fn input(drafting: &[&str], arbiter: &str) -> RunConsensusInput {
        let request = ConsensusRequest::new(
            "How does Rust achieve memory safety?",
            vec!["The borrow checker enforces aliasing rules.".to_string()],
            JobOptions::default(),
        )
        .unwrap();
        RunConsensusInput::new(
            request,
            drafting.iter().map(|m| model(m)).collect(),
            model(arbiter),
        )
        .with_params(ExecutionParams::default().with_call_timeout(Duration::from_secs(2)))
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressNotifier for RecordingProgress {
        fn on_phase_start(&self, phase: Phase, total_tasks: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}:{}", phase.as_str(), total_tasks));
        }

        fn on_phase_complete(&self, phase: Phase) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done:{}", phase.as_str()));
        }
    }

    #[tokio::test]
    async fn test_all_succeed_full_confidence() {
        let gateway = Arc::new(ScriptedGateway::new());
        let use_case = RunConsensusUseCase::new(Arc::clone(&gateway));

        let result = use_case.execute(input(&["a", "b", "c"], "arb")).await.unwrap();

        assert_eq!(result.drafts.len(), 3);
        assert_eq!(result.reviews.len(), 6);
        assert!(result.arbitration.succeeded);
        assert!((result.confidence - 0.98).abs() < 1e-9);
        assert_eq!(result.final_text, "arb Arbitration");
        // 3 drafts + 6 reviews + 1 arbitration, 20 tokens each
        assert_eq!(result.total_tokens.total_tokens, 200);
    }

    #[tokio::test]
    async fn test_one_draft_fails() {
        let gateway = Arc::new(
            ScriptedGateway::new().with("b", PromptKind::Draft, Script::fail(FailureReason::RateLimited)),
        );
        let use_case = RunConsensusUseCase::new(Arc::clone(&gateway));

        let result = use_case.execute(input(&["a", "b", "c"], "arb")).await.unwrap();

        assert_eq!(result.drafts.len(), 3);
        assert!(!result.drafts[1].succeeded);
        assert!(result.drafts[1].token_usage.is_zero());
        assert_eq!(result.reviews.len(), 2);
        assert!((result.confidence - 0.8667).abs() < 1e-3);
        assert!(result.reviews.iter().all(|r| r.reviewer.model_id != "b"));
        assert!(result.reviews.iter().all(|r| r.reviewed_model.model_id != "b"));
    }

    #[tokio::test]
    async fn test_review_order_is_reviewer_major() {
        let gateway = Arc::new(ScriptedGateway::new());
        let use_case = RunConsensusUseCase::new(Arc::clone(&gateway));

        let result = use_case.execute(input(&["a", "b", "c"], "arb")).await.unwrap();

        let pairs: Vec<(String, String)> = result
            .reviews
            .iter()
            .map(|r| (r.reviewer.model_id.clone(), r.reviewed_model.model_id.clone()))
            .collect();
        let expected: Vec<(String, String)> = [
            ("a", "b"),
            ("a", "c"),
            ("b", "a"),
            ("b", "c"),
            ("c", "a"),
            ("c", "b"),
        ]
        .iter()
        .map(|(x, y)| (x.to_string(), y.to_string()))
        .collect();
        assert_eq!(pairs, expected);
        assert_eq!(gateway.calls_of(PromptKind::Review), vec!["a", "a", "b", "b", "c", "c"]);
    }

    #[tokio::test]
    async fn test_failed_reviews_do_not_block() {
        let gateway = Arc::new(
            ScriptedGateway::new().with("a", PromptKind::Review, Script::fail(FailureReason::Timeout)),
        );
        let use_case = RunConsensusUseCase::new(gateway);

        let result = use_case.execute(input(&["a", "b", "c"], "arb")).await.unwrap();

        assert_eq!(result.reviews.len(), 6);
        assert_eq!(result.reviews.iter().filter(|r| r.succeeded).count(), 4);
        // 0.4 + 0.3 * 4/6 + 0.3
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_arbitration_failure_is_fatal() {
        let gateway = Arc::new(
            ScriptedGateway::new().with_any("arb", Script::fail(FailureReason::Upstream)),
        );
        let use_case = RunConsensusUseCase::new(gateway);

        let err = use_case.execute(input(&["a", "b", "c"], "arb")).await.unwrap_err();
        assert!(matches!(err, RunConsensusError::ArbitrationFailed(msg) if msg.starts_with("upstream")));
    }

    #[tokio::test]
    async fn test_empty_arbitration_is_failure() {
        let gateway = Arc::new(ScriptedGateway::new().with_any("arb", Script::ok_with("   ")));
        let use_case = RunConsensusUseCase::new(gateway);

        let err = use_case.execute(input(&["a", "b"], "arb")).await.unwrap_err();
        assert!(matches!(err, RunConsensusError::ArbitrationFailed(_)));
    }

    #[tokio::test]
    async fn test_zero_drafts_skips_later_phases() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_any("a", Script::fail(FailureReason::Auth))
                .with_any("b", Script::fail(FailureReason::Transport))
                .with_any("c", Script::fail(FailureReason::Timeout)),
        );
        let use_case = RunConsensusUseCase::new(Arc::clone(&gateway));
        let progress = RecordingProgress::default();

        let err = use_case
            .execute_with_progress(input(&["a", "b", "c"], "arb"), &progress, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RunConsensusError::NoSuccessfulDrafts {
                succeeded: 0,
                required: 1
            }
        );
        assert!(gateway.calls_of(PromptKind::Review).is_empty());
        assert!(gateway.calls_of(PromptKind::Arbitration).is_empty());
        assert_eq!(*progress.events.lock().unwrap(), vec!["start:drafting:3"]);
    }

    #[tokio::test]
    async fn test_single_draft_goes_straight_to_arbitration() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_any("b", Script::fail(FailureReason::Auth))
                .with_any("c", Script::fail(FailureReason::Auth)),
        );
        let use_case = RunConsensusUseCase::new(Arc::clone(&gateway));

        let result = use_case.execute(input(&["a", "b", "c"], "arb")).await.unwrap();

        assert!(result.reviews.is_empty());
        // 0.4 * 1/3 + 0 + 0.3
        assert!((result.confidence - (0.4 / 3.0 + 0.3)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_min_successful_drafts_threshold() {
        let gateway = Arc::new(ScriptedGateway::new().with_any("b", Script::fail(FailureReason::Auth)));
        let use_case = RunConsensusUseCase::new(gateway);
        let mut run = input(&["a", "b"], "arb");
        run.params = run.params.with_min_successful_drafts(2);

        let err = use_case.execute(run).await.unwrap_err();
        assert_eq!(
            err,
            RunConsensusError::NoSuccessfulDrafts {
                succeeded: 1,
                required: 2
            }
        );
    }

    #[tokio::test]
    async fn test_no_models() {
        let use_case = RunConsensusUseCase::new(Arc::new(ScriptedGateway::new()));
        let err = use_case.execute(input(&[], "arb")).await.unwrap_err();
        assert_eq!(err, RunConsensusError::NoModels);
    }

    #[tokio::test]
    async fn test_progress_sequence() {
        let use_case = RunConsensusUseCase::new(Arc::new(ScriptedGateway::new()));
        let progress = RecordingProgress::default();

        use_case
            .execute_with_progress(input(&["a", "b"], "arb"), &progress, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            *progress.events.lock().unwrap(),
            vec![
                "start:drafting:2",
                "done:drafting",
                "start:peer_review:2",
                "done:peer_review",
                "start:arbitration:1",
                "done:arbitration",
            ]
        );
    }

    #[tokio::test]
    async fn test_cancelled_run() {
        let use_case = RunConsensusUseCase::new(Arc::new(ScriptedGateway::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = use_case
            .execute_with_progress(input(&["a", "b"], "arb"), &NoProgress, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, RunConsensusError::Cancelled);
    }

    #[tokio::test]
    async fn test_drafting_prompt_runs_in_parallel() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with("a", PromptKind::Draft, Script::ok().delayed(Duration::from_millis(150)))
                .with("b", PromptKind::Draft, Script::ok().delayed(Duration::from_millis(150)))
                .with("c", PromptKind::Draft, Script::ok().delayed(Duration::from_millis(150))),
        );
        let use_case = RunConsensusUseCase::new(gateway);

        let started = std::time::Instant::now();
        use_case.execute(input(&["a", "b", "c"], "arb")).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
