//! Output formatter trait

use consensus_domain::{ConsensusResult, Job};

/// Trait for formatting consensus results
pub trait OutputFormatter {
    /// Format the complete result: drafts, reviews and final report
    fn format(&self, result: &ConsensusResult) -> String;

    /// Format the final report only (concise output)
    fn format_final_only(&self, result: &ConsensusResult) -> String;

    /// Format a job snapshot as JSON
    fn format_json(&self, job: &Job) -> String;

    /// Format a failed job
    fn format_failure(&self, job: &Job) -> String;
}
