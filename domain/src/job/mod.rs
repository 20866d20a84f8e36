//! Job domain.
//!
//! A [`Job`] is the pollable record of one consensus run. It only moves
//! forward: status never regresses and progress never decreases.

mod entities;

pub use entities::milestones;
pub use entities::{Job, JobId, JobPhase, JobStateError, JobStatus, PhaseSpan, PhaseTimestamps};
