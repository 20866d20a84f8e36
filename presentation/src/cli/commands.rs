//! CLI command definitions

use clap::{Parser, ValueEnum};
use consensus_domain::Priority;
use std::path::PathBuf;

/// Output format for consensus results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full formatted output with every draft, review and the final report
    Full,
    /// Only the arbiter's final report
    Final,
    /// JSON output of the complete job
    Json,
}

/// CLI arguments for consensus-engine
#[derive(Parser, Debug)]
#[command(name = "consensus-engine")]
#[command(author, version, about = "Multi-provider consensus - several models draft, review and agree")]
#[command(long_about = r#"
consensus-engine asks several language models about one topic and merges
their answers into a single report with a confidence score.

The process has three phases:
1. Drafting: every drafting model answers the topic in parallel
2. Peer Review: each successful drafter critiques every other draft
3. Arbitration: the arbiter synthesizes drafts and reviews into the final report

API keys are read from OPENAI_API_KEY, ANTHROPIC_API_KEY and GEMINI_API_KEY
unless configured otherwise.

Configuration files are loaded from (in priority order):
1. CONSENSUS_* environment variables
2. --config <path>        Explicit config file
3. ./consensus.toml       Project-level config
4. ~/.config/consensus-engine/config.toml   Global config

Example:
  consensus-engine "What are the trade-offs of Rust's borrow checker?"
  consensus-engine -s notes.md -s "Rust 2024 edition changes" -o final "Summarize the edition changes"
"#)]
pub struct Cli {
    /// The topic to analyze (10 to 1000 characters)
    pub topic: Option<String>,

    /// Source material: a file path or literal text (repeatable, up to 10)
    #[arg(short, long, value_name = "SOURCE")]
    pub source: Vec<String>,

    /// Requested upper bound on answer length, in characters (100 to 20000)
    #[arg(long, value_name = "CHARS")]
    pub max_response_length: Option<usize>,

    /// Scheduling hint carried with the job
    #[arg(long, default_value = "normal")]
    pub priority: Priority,

    /// Output format
    #[arg(short, long, value_enum, default_value = "final")]
    pub output: OutputFormat,

    /// How often to poll the job status, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 250)]
    pub poll_interval_ms: u64,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show the effective configuration and its sources, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::try_parse_from([
            "consensus-engine",
            "-s",
            "first source",
            "--source",
            "second source",
            "--max-response-length",
            "1500",
            "--priority",
            "high",
            "-o",
            "json",
            "-vv",
            "What is the future of WebAssembly?",
        ])
        .unwrap();

        assert_eq!(cli.topic.as_deref(), Some("What is the future of WebAssembly?"));
        assert_eq!(cli.source, vec!["first source", "second source"]);
        assert_eq!(cli.max_response_length, Some(1500));
        assert_eq!(cli.priority, Priority::High);
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["consensus-engine", "A topic long enough"]).unwrap();
        assert_eq!(cli.priority, Priority::Normal);
        assert_eq!(cli.output, OutputFormat::Final);
        assert_eq!(cli.poll_interval_ms, 250);
        assert!(cli.source.is_empty());
    }

    #[test]
    fn test_unknown_priority_rejected() {
        assert!(Cli::try_parse_from(["consensus-engine", "--priority", "urgent", "topic"]).is_err());
    }
}
