//! Query value objects

use crate::core::model::{ModelDescriptor, ProviderId};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Normalized token counts for one or more provider calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Use the vendor-reported total when present, otherwise the sum.
    pub fn with_reported_total(mut self, total: Option<u64>) -> Self {
        if let Some(total) = total {
            self.total_tokens = total;
        }
        self
    }

    pub fn is_zero(&self) -> bool {
        self.total_tokens == 0
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for TokenUsage {
    fn sum<I: Iterator<Item = TokenUsage>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), Add::add)
    }
}

/// Generation parameters applied to a single call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

impl QueryOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One canonical request to one provider + model. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub provider_id: ProviderId,
    pub model_id: String,
    pub prompt: String,
    pub options: QueryOptions,
}

impl QueryRequest {
    pub fn new(model: &ModelDescriptor, prompt: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            provider_id: model.provider_id,
            model_id: model.model_id.clone(),
            prompt: prompt.into(),
            options,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.options.timeout
    }
}

/// Why a query produced no content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    Auth,
    RateLimited,
    Upstream,
    MalformedResponse,
    Transport,
    UnknownProvider,
    Cancelled,
    Internal,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::Auth => "auth",
            FailureReason::RateLimited => "rate_limited",
            FailureReason::Upstream => "upstream",
            FailureReason::MalformedResponse => "malformed_response",
            FailureReason::Transport => "transport",
            FailureReason::UnknownProvider => "unknown_provider",
            FailureReason::Cancelled => "cancelled",
            FailureReason::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResult {
    Success { content: String, usage: TokenUsage },
    Failure { reason: FailureReason, message: String },
}

impl QueryResult {
    pub fn success(content: impl Into<String>, usage: TokenUsage) -> Self {
        QueryResult::Success {
            content: content.into(),
            usage,
        }
    }

    pub fn failure(reason: FailureReason, message: impl Into<String>) -> Self {
        QueryResult::Failure {
            reason,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }

    /// Usage of the call; zero for failures.
    pub fn usage(&self) -> TokenUsage {
        match self {
            QueryResult::Success { usage, .. } => *usage,
            QueryResult::Failure { .. } => TokenUsage::default(),
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            QueryResult::Success { .. } => None,
            QueryResult::Failure { reason, .. } => Some(*reason),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
