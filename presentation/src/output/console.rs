//! Console output formatter for consensus results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use consensus_domain::{ConsensusResult, Job};

/// Formats consensus results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &ConsensusResult) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&Self::header("Consensus Report"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Topic:".cyan().bold(),
            result.metadata.topic
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Models:".cyan().bold(),
            Self::model_list(result)
        ));
        output.push_str(&Self::summary_line(result));
        output.push('\n');

        // Phase 1: Drafts
        output.push_str(&Self::section_header("Phase 1: Drafts"));
        for draft in &result.drafts {
            if draft.succeeded {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── {} ──", draft.model).yellow().bold(),
                    draft.content
                ));
            } else {
                output.push_str(&format!(
                    "\n{}\nError: {}\n",
                    format!("── {} ──", draft.model).red().bold(),
                    draft.error.as_deref().unwrap_or("Unknown")
                ));
            }
        }

        // Phase 2: Peer Reviews (if any)
        if !result.reviews.is_empty() {
            output.push_str(&Self::section_header("Phase 2: Peer Reviews"));
            for review in &result.reviews {
                let title = format!("── {} reviewed {} ──", review.reviewer, review.reviewed_model);
                if review.succeeded {
                    output.push_str(&format!("\n{}\n{}\n", title.yellow().bold(), review.content));
                } else {
                    output.push_str(&format!(
                        "\n{}\nError: {}\n",
                        title.red().bold(),
                        review.error.as_deref().unwrap_or("Unknown")
                    ));
                }
            }
        }

        // Phase 3: Arbitration
        output.push_str(&Self::section_header("Phase 3: Final Report"));
        output.push_str(&format!(
            "\n{}\n\n{}\n",
            format!("Arbiter: {}", result.arbitration.arbiter).yellow().bold(),
            result.final_text
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Format the final report only (concise output)
    pub fn format_final_only(result: &ConsensusResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Consensus Report ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n\n", "Topic:".bold(), result.metadata.topic));
        output.push_str(&format!(
            "{} {}\n",
            "Models consulted:".dimmed(),
            Self::model_list(result)
        ));
        output.push_str(&Self::summary_line(result));
        output.push('\n');

        output.push_str(&result.final_text);
        output.push('\n');
        output
    }

    /// Format a job snapshot as JSON
    pub fn format_json(job: &Job) -> String {
        serde_json::to_string_pretty(job).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format a failed job
    pub fn format_failure(job: &Job) -> String {
        format!(
            "{} job {} failed: {}\n",
            "Error:".red().bold(),
            job.job_id,
            job.error.as_deref().unwrap_or("unknown error")
        )
    }

    fn model_list(result: &ConsensusResult) -> String {
        result
            .metadata
            .drafting_models
            .iter()
            .map(|m| m.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn summary_line(result: &ConsensusResult) -> String {
        let confidence = format!("{:.0}%", result.confidence * 100.0);
        let confidence = if result.confidence >= 0.8 {
            confidence.green()
        } else if result.confidence >= 0.5 {
            confidence.yellow()
        } else {
            confidence.red()
        };

        format!(
            "{} {}   {} {}/{} drafts, {} reviews   {} {}   {} {:.1}s\n",
            "Confidence:".cyan().bold(),
            confidence,
            "Answered:".dimmed(),
            result.metadata.successful_drafts,
            result.drafts.len(),
            result.metadata.successful_reviews,
            "Tokens:".dimmed(),
            result.total_tokens.total_tokens,
            "Took:".dimmed(),
            result.metadata.duration_ms as f64 / 1000.0
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &ConsensusResult) -> String {
        Self::format(result)
    }

    fn format_final_only(&self, result: &ConsensusResult) -> String {
        Self::format_final_only(result)
    }

    fn format_json(&self, job: &Job) -> String {
        Self::format_json(job)
    }

    fn format_failure(&self, job: &Job) -> String {
        Self::format_failure(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use consensus_domain::{
        ArbitrationRecord, DraftRecord, FailureReason, JobId, ModelDescriptor, ProviderId,
        QueryResult, ReviewRecord, TokenUsage,
    };

    fn result() -> ConsensusResult {
        let a = ModelDescriptor::new(ProviderId::OpenAi, "gpt-4o").with_display_name("GPT-4o");
        let b = ModelDescriptor::new(ProviderId::Gemini, "gemini-2.5-pro")
            .with_display_name("Gemini");
        let arb = ModelDescriptor::new(ProviderId::Anthropic, "claude-sonnet-4-5")
            .with_display_name("Claude");

        ConsensusResult::assemble(
            "Is Rust a good fit for embedded systems?",
            0,
            vec![
                DraftRecord::from_result(
                    a.clone(),
                    QueryResult::success("Yes, with no_std.", TokenUsage::new(5, 5)),
                ),
                DraftRecord::from_result(
                    b.clone(),
                    QueryResult::failure(FailureReason::RateLimited, "quota exceeded"),
                ),
            ],
            Vec::<ReviewRecord>::new(),
            ArbitrationRecord::from_result(
                arb,
                QueryResult::success("Rust fits embedded work well.", TokenUsage::new(5, 5)),
            ),
            Utc::now(),
        )
    }

    #[test]
    fn test_full_format_lists_every_draft() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format(&result());

        assert!(output.contains("Is Rust a good fit for embedded systems?"));
        assert!(output.contains("Yes, with no_std."));
        assert!(output.contains("rate_limited: quota exceeded"));
        assert!(output.contains("Rust fits embedded work well."));
        assert!(!output.contains("Phase 2: Peer Reviews"));
    }

    #[test]
    fn test_final_only_format() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format_final_only(&result());

        assert!(output.contains("Models consulted: GPT-4o, Gemini"));
        assert!(output.ends_with("Rust fits embedded work well.\n"));
        assert!(!output.contains("Yes, with no_std."));
    }

    #[test]
    fn test_failure_format() {
        colored::control::set_override(false);
        let mut job = Job::new(JobId::from("job-9"), "Is Rust a good fit?");
        job.fail("Arbitration failed: upstream").unwrap();

        let output = ConsoleFormatter::format_failure(&job);
        assert_eq!(output, "Error: job job-9 failed: Arbitration failed: upstream\n");
    }

    #[test]
    fn test_json_format_is_parseable() {
        let mut job = Job::new(JobId::from("job-1"), "Is Rust a good fit?");
        job.complete(result()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&job)).unwrap();
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["progress_percent"], 100);
        assert_eq!(value["result"]["final_text"], "Rust fits embedded work well.");
    }
}
