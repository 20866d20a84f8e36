//! Execution parameters - per-call generation and pipeline thresholds.
//!
//! [`ExecutionParams`] groups the static parameters the
//! [`RunConsensusUseCase`](crate::use_cases::run_consensus::RunConsensusUseCase)
//! applies to every provider call it issues.

use consensus_domain::QueryOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rough characters-per-token ratio used to turn a character limit into a token cap
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Timeout for each provider call.
    pub call_timeout: Duration,
    /// Upper bound on generated tokens per call.
    pub max_tokens: u32,
    /// Sampling temperature for every call.
    pub temperature: f32,
    /// Successful drafts required to leave Phase 1.
    pub min_successful_drafts: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            max_tokens: 2048,
            temperature: 0.7,
            min_successful_drafts: 1,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_min_successful_drafts(mut self, min: usize) -> Self {
        self.min_successful_drafts = min.max(1);
        self
    }

    // ==================== Query Options ====================

    /// Options for calls that are not length-limited (peer review)
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_timeout(self.call_timeout)
    }

    /// Options for calls bounded by a requested response length (drafting, arbitration)
    pub fn bounded_query_options(&self, max_response_length: Option<usize>) -> QueryOptions {
        let options = self.query_options();
        match max_response_length {
            Some(chars) => {
                let cap = chars.div_ceil(CHARS_PER_TOKEN).min(u32::MAX as usize) as u32;
                options.with_max_tokens(cap.min(self.max_tokens))
            }
            None => options,
        }
    }
}
