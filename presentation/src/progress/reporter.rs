//! Progress reporting while polling a consensus job

use colored::Colorize;
use consensus_domain::{Job, JobPhase, JobStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Renders successive job snapshots
pub trait JobProgressView: Send + Sync {
    /// Called with every polled snapshot
    fn update(&self, job: &Job);

    /// Called once with the terminal snapshot
    fn finish(&self, job: &Job);
}

fn phase_display_name(phase: JobPhase) -> &'static str {
    match phase {
        JobPhase::Phase1 => "Phase 1: Drafting",
        JobPhase::Phase2 => "Phase 2: Peer Review",
        JobPhase::Phase3 => "Phase 3: Arbitration",
        JobPhase::Completed => "Completed",
    }
}

/// Progress bar driven by `progress_percent`
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(Self::style());
        bar.set_prefix("Consensus");
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JobProgressView for ProgressReporter {
    fn update(&self, job: &Job) {
        self.bar.set_position(u64::from(job.progress_percent));
        let message = match job.status {
            JobStatus::Started => "Queued".to_string(),
            _ => phase_display_name(job.phase).to_string(),
        };
        self.bar.set_message(message);
    }

    fn finish(&self, job: &Job) {
        self.bar.set_position(u64::from(job.progress_percent));
        match job.status {
            JobStatus::Completed => self
                .bar
                .finish_with_message(format!("{}", "Consensus reached!".green())),
            _ => self
                .bar
                .abandon_with_message(format!("{}", "Job failed".red())),
        }
    }
}

/// Plain line-per-change progress for non-terminal stderr
#[derive(Default)]
pub struct SimpleProgress {
    last: Mutex<Option<(JobStatus, JobPhase)>>,
}

impl SimpleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobProgressView for SimpleProgress {
    fn update(&self, job: &Job) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let current = (job.status, job.phase);
        if *last == Some(current) || job.status == JobStatus::Started {
            return;
        }
        *last = Some(current);
        eprintln!(
            "{} {} ({}%)",
            "->".cyan(),
            phase_display_name(job.phase).bold(),
            job.progress_percent
        );
    }

    fn finish(&self, job: &Job) {
        match job.status {
            JobStatus::Completed => eprintln!("  {} done", "v".green()),
            _ => eprintln!("  {} failed", "x".red()),
        }
    }
}
