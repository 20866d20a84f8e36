//! Confidence scoring for a finished pipeline.
//!
//! The score is synthetic: it measures how much of the pipeline completed,
//! not how correct the answer is.
//!
//! ```text
//! confidence = clamp(0.1, 0.98,
//!     0.4 · successful_drafts / drafting_models
//!   + 0.3 · successful_reviews / (k · (k − 1))
//!   + 0.3 · arbitration_succeeded)
//! ```
//!
//! where `k` is the number of successful drafts.

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 0.98;

const DRAFT_WEIGHT: f64 = 0.4;
const REVIEW_WEIGHT: f64 = 0.3;
const ARBITRATION_WEIGHT: f64 = 0.3;

/// Inputs to [`confidence_score`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub drafting_models: usize,
    pub successful_drafts: usize,
    pub successful_reviews: usize,
    pub arbitration_succeeded: bool,
}

impl PhaseOutcome {
    /// Ordered reviewer/reviewed pairs among successful drafts
    pub fn max_possible_reviews(&self) -> usize {
        let k = self.successful_drafts;
        k * k.saturating_sub(1)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        (numerator as f64 / denominator as f64).min(1.0)
    }
}

pub fn confidence_score(outcome: &PhaseOutcome) -> f64 {
    let draft_term = DRAFT_WEIGHT * ratio(outcome.successful_drafts, outcome.drafting_models);
    let review_term = REVIEW_WEIGHT
        * ratio(outcome.successful_reviews, outcome.max_possible_reviews());
    let arbitration_term = if outcome.arbitration_succeeded {
        ARBITRATION_WEIGHT
    } else {
        0.0
    };

    (draft_term + review_term + arbitration_term).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(n: usize, k: usize, r: usize, arb: bool) -> PhaseOutcome {
        PhaseOutcome {
            drafting_models: n,
            successful_drafts: k,
            successful_reviews: r,
            arbitration_succeeded: arb,
        }
    }

    #[test]
    fn test_full_success_is_capped() {
        let score = confidence_score(&outcome(3, 3, 6, true));
        assert_eq!(score, MAX_CONFIDENCE);
    }

    #[test]
    fn test_two_of_three_drafts() {
        let score = confidence_score(&outcome(3, 2, 2, true));
        assert!((score - 0.8667).abs() < 1e-4, "score was {}", score);
    }

    #[test]
    fn test_single_draft_has_no_review_term() {
        let o = outcome(3, 1, 0, true);
        assert_eq!(o.max_possible_reviews(), 0);
        let score = confidence_score(&o);
        assert!((score - (0.4 / 3.0 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_total_failure_is_floored() {
        assert_eq!(confidence_score(&outcome(3, 0, 0, false)), MIN_CONFIDENCE);
        assert_eq!(confidence_score(&outcome(0, 0, 0, false)), MIN_CONFIDENCE);
    }

    #[test]
    fn test_always_within_bounds() {
        for n in 0..=5usize {
            for k in 0..=n {
                let max_reviews = k * k.saturating_sub(1);
                for r in 0..=max_reviews {
                    for arb in [false, true] {
                        let score = confidence_score(&outcome(n, k, r, arb));
                        assert!(
                            (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&score),
                            "n={} k={} r={} arb={} -> {}",
                            n,
                            k,
                            r,
                            arb,
                            score
                        );
                    }
                }
            }
        }
    }
}
