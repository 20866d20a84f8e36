//! Bridges pipeline progress callbacks onto a stored job.

use super::store::JobStore;
use crate::ports::progress::ProgressNotifier;
use consensus_domain::{JobId, Phase};
use std::sync::Arc;
use tracing::warn;

/// [`ProgressNotifier`] that moves one job through its milestones
pub struct JobProgressTracker {
    store: Arc<JobStore>,
    job_id: JobId,
}

impl JobProgressTracker {
    pub fn new(store: Arc<JobStore>, job_id: JobId) -> Self {
        Self { store, job_id }
    }
}

impl ProgressNotifier for JobProgressTracker {
    fn on_phase_start(&self, phase: Phase, _total_tasks: usize) {
        if let Err(e) = self
            .store
            .update(&self.job_id, |job| job.mark_phase_started(phase))
        {
            warn!(job_id = %self.job_id, phase = phase.as_str(), "Progress update dropped: {}", e);
        }
    }

    fn on_phase_complete(&self, phase: Phase) {
        if let Err(e) = self
            .store
            .update(&self.job_id, |job| job.mark_phase_completed(phase))
        {
            warn!(job_id = %self.job_id, phase = phase.as_str(), "Progress update dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_domain::{Job, JobPhase, JobStatus, milestones};

    #[test]
    fn test_milestones_follow_phases() {
        let store = Arc::new(JobStore::new());
        let id = JobId::from("job-1");
        store.insert(Job::new(id.clone(), "What is Rust ownership?"));
        let tracker = JobProgressTracker::new(Arc::clone(&store), id.clone());

        tracker.on_phase_start(Phase::Drafting, 3);
        let job = store.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress_percent, milestones::DRAFTING_STARTED);

        tracker.on_phase_complete(Phase::Drafting);
        tracker.on_phase_start(Phase::PeerReview, 6);
        tracker.on_phase_complete(Phase::PeerReview);
        let job = store.get(&id).unwrap();
        assert_eq!(job.phase, JobPhase::Phase2);
        assert_eq!(job.progress_percent, milestones::REVIEW_COMPLETED);
        assert!(job.phase_timestamps.phase2.unwrap().completed_at.is_some());
    }

    #[test]
    fn test_missing_job_is_ignored() {
        let tracker = JobProgressTracker::new(Arc::new(JobStore::new()), JobId::from("gone"));
        tracker.on_phase_start(Phase::Drafting, 3);
        tracker.on_phase_complete(Phase::Drafting);
    }
}
