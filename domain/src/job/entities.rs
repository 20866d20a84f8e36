//! Job entity and its value objects

use crate::orchestration::entities::Phase;
use crate::orchestration::value_objects::ConsensusResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Progress checkpoints reported at phase boundaries
pub mod milestones {
    pub const DRAFTING_STARTED: u8 = 10;
    pub const DRAFTING_COMPLETED: u8 = 35;
    pub const REVIEW_COMPLETED: u8 = 65;
    pub const ARBITRATION_COMPLETED: u8 = 90;
    pub const DONE: u8 = 100;
}

/// Opaque job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Started,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Started => "STARTED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Externally visible phase label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Phase1,
    Phase2,
    Phase3,
    Completed,
}

impl From<Phase> for JobPhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Drafting => JobPhase::Phase1,
            Phase::PeerReview => JobPhase::Phase2,
            Phase::Arbitration => JobPhase::Phase3,
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobPhase::Phase1 => "phase1",
            JobPhase::Phase2 => "phase2",
            JobPhase::Phase3 => "phase3",
            JobPhase::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpan {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase1: Option<PhaseSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase2: Option<PhaseSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase3: Option<PhaseSpan>,
}

impl PhaseTimestamps {
    fn slot(&mut self, phase: Phase) -> &mut Option<PhaseSpan> {
        match phase {
            Phase::Drafting => &mut self.phase1,
            Phase::PeerReview => &mut self.phase2,
            Phase::Arbitration => &mut self.phase3,
        }
    }

    pub fn get(&self, phase: Phase) -> Option<&PhaseSpan> {
        match phase {
            Phase::Drafting => self.phase1.as_ref(),
            Phase::PeerReview => self.phase2.as_ref(),
            Phase::Arbitration => self.phase3.as_ref(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobStateError {
    #[error("Job {job_id} is already {status}")]
    AlreadyTerminal { job_id: JobId, status: JobStatus },

    #[error("Job {job_id} cannot move back from {from} to {to}")]
    PhaseRegression {
        job_id: JobId,
        from: JobPhase,
        to: JobPhase,
    },
}

/// Pollable record of one consensus run (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub topic: String,
    pub status: JobStatus,
    pub phase: JobPhase,
    pub progress_percent: u8,
    pub phase_timestamps: PhaseTimestamps,
    pub result: Option<ConsensusResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_id: JobId, topic: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            topic: topic.into(),
            status: JobStatus::Started,
            phase: JobPhase::Phase1,
            progress_percent: 0,
            phase_timestamps: PhaseTimestamps::default(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_live(&self) -> Result<(), JobStateError> {
        if self.is_terminal() {
            return Err(JobStateError::AlreadyTerminal {
                job_id: self.job_id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    fn advance_progress(&mut self, milestone: u8) {
        self.progress_percent = self.progress_percent.max(milestone);
    }

    pub fn mark_phase_started(&mut self, phase: Phase) -> Result<(), JobStateError> {
        self.ensure_live()?;
        let next = JobPhase::from(phase);
        if next < self.phase {
            return Err(JobStateError::PhaseRegression {
                job_id: self.job_id.clone(),
                from: self.phase,
                to: next,
            });
        }

        let now = Utc::now();
        self.status = JobStatus::Processing;
        self.phase = next;
        self.phase_timestamps.slot(phase).get_or_insert(PhaseSpan {
            started_at: now,
            completed_at: None,
        });
        if phase == Phase::Drafting {
            self.advance_progress(milestones::DRAFTING_STARTED);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_phase_completed(&mut self, phase: Phase) -> Result<(), JobStateError> {
        self.ensure_live()?;
        let now = Utc::now();
        if let Some(span) = self.phase_timestamps.slot(phase).as_mut() {
            span.completed_at.get_or_insert(now);
        }
        self.advance_progress(match phase {
            Phase::Drafting => milestones::DRAFTING_COMPLETED,
            Phase::PeerReview => milestones::REVIEW_COMPLETED,
            Phase::Arbitration => milestones::ARBITRATION_COMPLETED,
        });
        self.updated_at = now;
        Ok(())
    }

    pub fn complete(&mut self, result: ConsensusResult) -> Result<(), JobStateError> {
        self.ensure_live()?;
        self.status = JobStatus::Completed;
        self.phase = JobPhase::Completed;
        self.advance_progress(milestones::DONE);
        self.result = Some(result);
        self.error = None;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), JobStateError> {
        self.ensure_live()?;
        self.status = JobStatus::Failed;
        self.result = None;
        self.error = Some(message.into());
        self.updated_at = Utc::now();
        Ok(())
    }
}
