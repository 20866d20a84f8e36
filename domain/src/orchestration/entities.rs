//! Orchestration domain entities

use serde::{Deserialize, Serialize};

/// Working phase of a consensus run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Every drafting model answers the topic independently
    Drafting,
    /// Each successful drafter critiques every other successful draft
    PeerReview,
    /// The arbiter synthesizes drafts and reviews into the final text
    Arbitration,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Drafting => "drafting",
            Phase::PeerReview => "peer_review",
            Phase::Arbitration => "arbitration",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Drafting => "Drafting",
            Phase::PeerReview => "Peer Review",
            Phase::Arbitration => "Arbitration",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// State machine of one pipeline run
///
/// ```text
/// Init → Drafting → PeerReview → Arbitration → Done
///   └────────┴───────────┴────────────┴──────→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Drafting,
    PeerReview,
    Arbitration,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Init, Drafting) => true,
            (Drafting, PeerReview) => true,
            (PeerReview, Arbitration) => true,
            (Arbitration, Done) => true,
            _ => false,
        }
    }

    /// Move to `next`, or return the unchanged state if the edge does not exist.
    pub fn transition(self, next: PipelineState) -> Result<PipelineState, PipelineState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(self)
        }
    }
}

impl From<Phase> for PipelineState {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Drafting => PipelineState::Drafting,
            Phase::PeerReview => PipelineState::PeerReview,
            Phase::Arbitration => PipelineState::Arbitration,
        }
    }
}
