//! Topic, sources and job options (Value Objects)

use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};

pub const TOPIC_MIN_CHARS: usize = 10;
pub const TOPIC_MAX_CHARS: usize = 1000;
pub const MAX_SOURCES: usize = 10;
pub const SOURCE_MAX_CHARS: usize = 5000;
pub const RESPONSE_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 100..=20_000;

/// The subject every drafting model writes about
///
/// Length is counted in characters after trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    pub fn new(content: impl Into<String>) -> Result<Self, ValidationError> {
        let content = content.into().trim().to_string();
        let actual = content.chars().count();
        if actual < TOPIC_MIN_CHARS {
            return Err(ValidationError::TopicTooShort {
                min: TOPIC_MIN_CHARS,
                actual,
            });
        }
        if actual > TOPIC_MAX_CHARS {
            return Err(ValidationError::TopicTooLong {
                max: TOPIC_MAX_CHARS,
                actual,
            });
        }
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::new(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scheduling hint carried with a job. Advisory only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidOption(format!(
                "unknown priority '{}'",
                other
            ))),
        }
    }
}

/// Per-job options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    pub priority: Priority,
    /// Requested upper bound on the length of each answer, in characters
    pub max_response_length: Option<usize>,
}

impl JobOptions {
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_response_length(mut self, length: usize) -> Self {
        self.max_response_length = Some(length);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(len) = self.max_response_length
            && !RESPONSE_LENGTH_RANGE.contains(&len)
        {
            return Err(ValidationError::InvalidOption(format!(
                "max_response_length must be within {}..={} (got {})",
                RESPONSE_LENGTH_RANGE.start(),
                RESPONSE_LENGTH_RANGE.end(),
                len
            )));
        }
        Ok(())
    }
}

/// A validated request to run one consensus job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRequest {
    topic: Topic,
    sources: Vec<String>,
    options: JobOptions,
}

impl ConsensusRequest {
    pub fn new(
        topic: impl Into<String>,
        sources: Vec<String>,
        options: JobOptions,
    ) -> Result<Self, ValidationError> {
        let topic = Topic::new(topic)?;

        if sources.len() > MAX_SOURCES {
            return Err(ValidationError::TooManySources {
                max: MAX_SOURCES,
                actual: sources.len(),
            });
        }
        for (index, source) in sources.iter().enumerate() {
            let actual = source.chars().count();
            if actual > SOURCE_MAX_CHARS {
                return Err(ValidationError::SourceTooLong {
                    index,
                    max: SOURCE_MAX_CHARS,
                    actual,
                });
            }
        }
        options.validate()?;

        Ok(Self {
            topic,
            sources,
            options,
        })
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn options(&self) -> &JobOptions {
        &self.options
    }
}
