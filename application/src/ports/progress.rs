//! Progress notification port
//!
//! Defines the interface for reporting phase boundaries during a consensus run.

use consensus_domain::{ModelDescriptor, Phase};

/// Callback for progress updates during pipeline execution
///
/// The job manager implements this to move job milestones; other
/// implementations can display progress however they like.
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: Phase, total_tasks: usize);

    /// Called when a single call within a phase settles
    fn on_task_complete(&self, _phase: Phase, _model: &ModelDescriptor, _success: bool) {}

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: Phase);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: Phase, _total_tasks: usize) {}
    fn on_phase_complete(&self, _phase: Phase) {}
}
