//! Job Manager
//!
//! Owns the job store, starts one supervised pipeline task per job and
//! answers status polls with snapshots.
//!
//! ```text
//! create_job ──▶ store: STARTED ──▶ spawn supervisor ──▶ spawn pipeline
//!                                         │                    │ progress
//!                                         │◀── JoinHandle ─────┘
//!                                         ▼
//!                            COMPLETED + ledger  |  FAILED(message)
//! ```

use crate::config::{ConsensusConfig, RetentionPolicy};
use crate::jobs::{JobError, JobProgressTracker, JobStore};
use crate::ports::provider_gateway::ProviderGateway;
use crate::ports::usage_ledger::{NoUsageLedger, UsageLedger, UsageReport};
use crate::use_cases::run_consensus::{RunConsensusInput, RunConsensusUseCase};
use chrono::Utc;
use consensus_domain::{ConsensusRequest, Job, JobId, JobOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

/// Failure message recorded when the pipeline task panics
pub const PANIC_MESSAGE: &str = "pipeline task panicked";

const MIN_REAP_INTERVAL: Duration = Duration::from_secs(1);

type RunningJobs = Arc<Mutex<HashMap<JobId, CancellationToken>>>;

pub struct JobManager<G: ProviderGateway + 'static> {
    use_case: Arc<RunConsensusUseCase<G>>,
    config: ConsensusConfig,
    store: Arc<JobStore>,
    ledger: Arc<dyn UsageLedger>,
    running: RunningJobs,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl<G: ProviderGateway + 'static> JobManager<G> {
    pub fn new(gateway: Arc<G>, config: ConsensusConfig) -> Self {
        Self {
            use_case: Arc::new(RunConsensusUseCase::new(gateway)),
            config,
            store: Arc::new(JobStore::new()),
            ledger: Arc::new(NoUsageLedger),
            running: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn UsageLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Validate the request, store a STARTED job and start its pipeline.
    ///
    /// Returns as soon as the job is stored. Must be called from within a
    /// tokio runtime.
    pub fn create_job(
        &self,
        topic: impl Into<String>,
        sources: Vec<String>,
        options: JobOptions,
    ) -> Result<JobId, JobError> {
        let request = ConsensusRequest::new(topic, sources, options)?;

        let job_id = JobId::generate();
        self.store
            .insert(Job::new(job_id.clone(), request.topic().as_str()));

        let cancel = self.shutdown.child_token();
        lock_running(&self.running).insert(job_id.clone(), cancel.clone());

        info!(
            job_id = %job_id,
            sources = request.sources().len(),
            priority = %request.options().priority,
            "Job created"
        );

        let input = RunConsensusInput::new(
            request,
            self.config.drafting.clone(),
            self.config.arbiter.clone(),
        )
        .with_params(self.config.execution.clone());

        let use_case = Arc::clone(&self.use_case);
        let progress = JobProgressTracker::new(Arc::clone(&self.store), job_id.clone());
        let pipeline_cancel = cancel.clone();
        let pipeline = self.tasks.spawn(async move {
            use_case
                .execute_with_progress(input, &progress, &pipeline_cancel)
                .await
        });

        let store = Arc::clone(&self.store);
        let ledger = Arc::clone(&self.ledger);
        let running = Arc::clone(&self.running);
        let supervised_id = job_id.clone();
        self.tasks.spawn(async move {
            let job_id = supervised_id;
            let outcome = pipeline.await;
            lock_running(&running).remove(&job_id);

            let update = match outcome {
                Ok(Ok(result)) => {
                    let report = UsageReport::from_result(job_id.clone(), &result);
                    info!(
                        job_id = %job_id,
                        confidence = result.confidence,
                        tokens = result.total_tokens.total_tokens,
                        "Job completed"
                    );
                    let recorded =
                        tokio::task::spawn_blocking(move || ledger.record(report)).await;
                    if let Err(e) = recorded {
                        warn!(job_id = %job_id, "Usage report dropped: {}", e);
                    }
                    store.update(&job_id, |job| job.complete(result))
                }
                Ok(Err(e)) => {
                    error!(job_id = %job_id, "Job failed: {}", e);
                    store.update(&job_id, |job| job.fail(e.to_string()))
                }
                Err(join_error) => {
                    let message = if join_error.is_panic() {
                        PANIC_MESSAGE
                    } else {
                        "cancelled"
                    };
                    error!(job_id = %job_id, "Pipeline task ended abnormally: {}", join_error);
                    store.update(&job_id, |job| job.fail(message))
                }
            };

            if let Err(e) = update {
                warn!(job_id = %job_id, "Final job update dropped: {}", e);
            }
        });

        Ok(job_id)
    }

    /// Snapshot of a job. Calling this never changes the job.
    pub fn get_status(&self, job_id: &JobId) -> Result<Job, JobError> {
        self.store
            .get(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.clone()))
    }

    /// Request cancellation of a running job.
    ///
    /// Returns `false` when the job has already finished.
    pub fn cancel_job(&self, job_id: &JobId) -> Result<bool, JobError> {
        if self.store.get(job_id).is_none() {
            return Err(JobError::NotFound(job_id.clone()));
        }

        match lock_running(&self.running).get(job_id) {
            Some(token) => {
                info!(job_id = %job_id, "Cancelling job");
                token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of jobs whose pipeline has not finished yet
    pub fn active_jobs(&self) -> usize {
        lock_running(&self.running).len()
    }

    /// Apply the retention policy once
    pub fn purge_expired(&self) -> usize {
        purge(&self.store, &self.config.retention)
    }

    /// Start the background task that applies the retention policy on
    /// every `reap_interval` until shutdown.
    pub fn spawn_reaper(&self) {
        let store = Arc::clone(&self.store);
        let retention = self.config.retention.clone();
        let shutdown = self.shutdown.clone();

        self.tasks.spawn(async move {
            let period = retention.reap_interval.max(MIN_REAP_INTERVAL);
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        purge(&store, &retention);
                    }
                }
            }
            debug!("Job reaper stopped");
        });
    }

    /// Cancel every running job and wait for all tasks to settle
    pub async fn shutdown(&self) {
        info!(active = self.active_jobs(), "Shutting down job manager");
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }
}

fn purge(store: &JobStore, retention: &RetentionPolicy) -> usize {
    let removed = store.purge(retention, Utc::now());
    if removed > 0 {
        debug!(removed, remaining = store.len(), "Purged finished jobs");
    }
    removed
}

fn lock_running(
    running: &RunningJobs,
) -> std::sync::MutexGuard<'_, HashMap<JobId, CancellationToken>> {
    running.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionParams;
    use crate::testing::{PromptKind, Script, ScriptedGateway};
    use consensus_domain::{
        FailureReason, JobPhase, JobStatus, ModelDescriptor, ProviderId, ValidationError,
        milestones,
    };

    const TOPIC: &str = "How does Rust achieve memory safety?";

    fn config() -> ConsensusConfig {
        ConsensusConfig::new(
            ["a", "b", "c"]
                .iter()
                .map(|m| ModelDescriptor::new(ProviderId::OpenAi, *m))
                .collect(),
            ModelDescriptor::new(ProviderId::Anthropic, "arb"),
        )
        .with_execution(ExecutionParams::default().with_call_timeout(Duration::from_secs(5)))
    }

    fn manager(gateway: ScriptedGateway) -> JobManager<ScriptedGateway> {
        JobManager::new(Arc::new(gateway), config())
    }

    async fn wait_terminal(manager: &JobManager<ScriptedGateway>, job_id: &JobId) -> Job {
        for _ in 0..500 {
            let job = manager.get_status(job_id).unwrap();
            if job.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", job_id);
    }

    #[derive(Default)]
    struct RecordingLedger {
        reports: Mutex<Vec<UsageReport>>,
    }

    impl UsageLedger for RecordingLedger {
        fn record(&self, report: UsageReport) {
            self.reports.lock().unwrap().push(report);
        }
    }

    #[tokio::test]
    async fn test_job_completes_with_result() {
        let manager = manager(ScriptedGateway::new());
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let job = wait_terminal(&manager, &job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.phase, JobPhase::Completed);
        assert_eq!(job.progress_percent, milestones::DONE);
        assert!(job.error.is_none());
        let result = job.result.unwrap();
        assert!((result.confidence - 0.98).abs() < 1e-9);
        assert!(job.phase_timestamps.phase1.is_some());
        assert!(job.phase_timestamps.phase2.is_some());
        assert!(job.phase_timestamps.phase3.unwrap().completed_at.is_some());
    }

    #[tokio::test]
    async fn test_create_returns_before_pipeline_finishes() {
        let gateway = ScriptedGateway::new().with(
            "a",
            PromptKind::Draft,
            Script::ok().delayed(Duration::from_millis(200)),
        );
        let manager = manager(gateway);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let job = manager.get_status(&job_id).unwrap();
        assert!(!job.is_terminal());
        assert!(job.progress_percent < milestones::DRAFTING_COMPLETED);
        assert_eq!(manager.active_jobs(), 1);

        wait_terminal(&manager, &job_id).await;
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let gateway = ScriptedGateway::new()
            .with("a", PromptKind::Draft, Script::ok().delayed(Duration::from_millis(50)))
            .with("arb", PromptKind::Arbitration, Script::ok().delayed(Duration::from_millis(50)));
        let manager = manager(gateway);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let mut seen = Vec::new();
        loop {
            let job = manager.get_status(&job_id).unwrap();
            seen.push(job.progress_percent);
            if job.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&milestones::DONE));
    }

    #[tokio::test]
    async fn test_validation_error_creates_no_job() {
        let manager = manager(ScriptedGateway::new());
        let err = manager
            .create_job("short", vec![], JobOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Validation(ValidationError::TopicTooShort { .. })
        ));
        assert_eq!(manager.active_jobs(), 0);
        assert!(manager.store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let manager = manager(ScriptedGateway::new());
        let missing = JobId::from("nope");
        assert_eq!(
            manager.get_status(&missing).unwrap_err(),
            JobError::NotFound(missing.clone())
        );
        assert_eq!(
            manager.cancel_job(&missing).unwrap_err(),
            JobError::NotFound(missing)
        );
    }

    #[tokio::test]
    async fn test_status_is_idempotent() {
        let manager = manager(ScriptedGateway::new());
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();
        let first = wait_terminal(&manager, &job_id).await;

        let second = manager.get_status(&job_id).unwrap();
        let third = manager.get_status(&job_id).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[tokio::test]
    async fn test_arbitration_failure_fails_job() {
        let gateway = ScriptedGateway::new().with_any("arb", Script::fail(FailureReason::Upstream));
        let manager = manager(gateway);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let job = wait_terminal(&manager, &job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result.is_none());
        assert!(job.error.unwrap().starts_with("Arbitration failed"));
    }

    #[tokio::test]
    async fn test_no_drafts_fails_before_review() {
        let gateway = ScriptedGateway::new()
            .with_any("a", Script::fail(FailureReason::Auth))
            .with_any("b", Script::fail(FailureReason::Auth))
            .with_any("c", Script::fail(FailureReason::Auth));
        let gateway = Arc::new(gateway);
        let manager = JobManager::new(Arc::clone(&gateway), config());
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let job = wait_terminal(&manager, &job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.result.is_none());
        assert!(job.phase_timestamps.phase2.is_none());
        assert!(job.phase_timestamps.phase3.is_none());
        assert!(gateway.calls_of(PromptKind::Review).is_empty());
        assert!(gateway.calls_of(PromptKind::Arbitration).is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_panic_is_captured() {
        let gateway = ScriptedGateway::new().with("arb", PromptKind::Arbitration, Script::panic());
        let manager = manager(gateway);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let job = wait_terminal(&manager, &job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some(PANIC_MESSAGE));
        assert_eq!(manager.active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_panic_during_review_is_recorded() {
        let gateway = ScriptedGateway::new().with("b", PromptKind::Review, Script::panic());
        let manager = manager(gateway);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let job = wait_terminal(&manager, &job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        let result = job.result.unwrap();
        assert_eq!(result.reviews.len(), 6);

        let (by_b, others): (Vec<_>, Vec<_>) = result
            .reviews
            .iter()
            .partition(|r| r.reviewer.model_id == "b");
        assert_eq!(by_b.len(), 2);
        assert!(by_b.iter().all(|r| !r.succeeded));
        assert!(by_b[0].error.as_deref().unwrap().starts_with("internal"));
        assert!(others.iter().all(|r| r.succeeded));
        assert_eq!(result.metadata.successful_reviews, 4);
    }

    #[tokio::test]
    async fn test_panic_during_drafting_is_absorbed() {
        let gateway = ScriptedGateway::new().with("b", PromptKind::Draft, Script::panic());
        let manager = manager(gateway);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        let job = wait_terminal(&manager, &job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        let result = job.result.unwrap();
        assert!(!result.drafts[1].succeeded);
        assert_eq!(result.reviews.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let gateway = ScriptedGateway::new().with_any("a", Script::ok().delayed(Duration::from_secs(10)));
        let manager = manager(gateway);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(manager.cancel_job(&job_id).unwrap());

        let job = wait_terminal(&manager, &job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("cancelled"));
        assert!(!manager.cancel_job(&job_id).unwrap());
    }

    #[tokio::test]
    async fn test_ledger_records_completed_jobs_only() {
        let ledger = Arc::new(RecordingLedger::default());
        let ok = manager(ScriptedGateway::new()).with_ledger(ledger.clone());
        let job_id = ok.create_job(TOPIC, vec![], JobOptions::default()).unwrap();
        wait_terminal(&ok, &job_id).await;

        let failing = manager(ScriptedGateway::new().with_any("arb", Script::fail(FailureReason::Auth)))
            .with_ledger(ledger.clone());
        let failed_id = failing.create_job(TOPIC, vec![], JobOptions::default()).unwrap();
        wait_terminal(&failing, &failed_id).await;

        let reports = ledger.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].job_id, job_id);
        // 3 drafts + 6 reviews + 1 arbitration, 20 tokens each
        assert_eq!(reports[0].total.total_tokens, 200);
        assert_eq!(reports[0].per_model.len(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_running_jobs() {
        let gateway = ScriptedGateway::new().with_any("a", Script::ok().delayed(Duration::from_secs(10)));
        let manager = manager(gateway);
        manager.spawn_reaper();
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), manager.shutdown())
            .await
            .unwrap();

        let job = manager.get_status(&job_id).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(manager.active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired_jobs() {
        let mut config = config();
        config.retention.ttl = Duration::ZERO;
        let manager = JobManager::new(Arc::new(ScriptedGateway::new()), config);
        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();
        wait_terminal(&manager, &job_id).await;

        assert_eq!(manager.purge_expired(), 1);
        assert!(matches!(manager.get_status(&job_id), Err(JobError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reaper_with_zero_interval_still_runs() {
        let mut config = config();
        config.retention.ttl = Duration::ZERO;
        config.retention.reap_interval = Duration::ZERO;
        let manager = JobManager::new(Arc::new(ScriptedGateway::new()), config);
        manager.spawn_reaper();

        let job_id = manager.create_job(TOPIC, vec![], JobOptions::default()).unwrap();
        wait_terminal(&manager, &job_id).await;

        let mut purged = false;
        for _ in 0..40 {
            if manager.get_status(&job_id).is_err() {
                purged = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(purged);
        manager.shutdown().await;
    }
}
