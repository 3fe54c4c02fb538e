//! Pure, deterministic confidence evolution (spec §4.2).
//!
//! Both functions here take and return plain `f64` confidence values
//! rather than full [`crate::types::Memory`] records, following the
//! teacher's preference for small, pure calculator functions
//! (`reward/adaptive/calculator.rs`) that the caller wires into its own
//! persistence step.

use crate::types::{clamp_confidence, Outcome, SatisfactionRating};

/// Half-life, in milliseconds, used by [`decay`]. Thirty days.
pub const DECAY_HALF_LIFE_MS: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Compute the confidence delta for an outcome and optional satisfaction
/// rating. Always `>= -0.05` for a success outcome with `rating >= 3` or
/// absent (spec §8.5), and always `< 0` for a failed/rejected outcome
/// with `rating <= 3` or absent (spec §8.6, combined with the caller's
/// floor check in [`reinforce`]).
fn confidence_delta(outcome: Outcome, rating: Option<SatisfactionRating>) -> f64 {
    match outcome {
        Outcome::SuccessAuto | Outcome::SuccessHumanReview => match rating {
            None => 0.05,
            Some(r) if r.is_non_negative() => 0.02 + 0.01 * f64::from(r.value() - 3),
            Some(r) => -0.02 * f64::from(3 - i32::from(r.value())),
        },
        Outcome::FailedValidation | Outcome::Rejected => match rating {
            None => -0.1,
            Some(r) if r.value() <= 3 => -0.05 - 0.03 * f64::from(3 - i32::from(r.value())),
            Some(_) => -0.03,
        },
    }
}

/// Reinforce a confidence value given an outcome and optional human
/// satisfaction rating (spec §4.2 `reinforce`).
///
/// Deterministic: identical inputs always yield identical outputs.
#[must_use]
pub fn reinforce(confidence: f64, outcome: Outcome, rating: Option<SatisfactionRating>) -> f64 {
    clamp_confidence(confidence + confidence_delta(outcome, rating))
}

/// Apply exponential time decay to a confidence value (spec §4.2 `decay`).
///
/// `decay(c, 0) == c`, `decay` is monotone non-increasing in `elapsed_ms`,
/// and the result never falls below [`crate::types::MIN_CONFIDENCE`].
#[must_use]
pub fn decay(confidence: f64, elapsed_ms: f64) -> f64 {
    use crate::types::MIN_CONFIDENCE;

    let elapsed_ms = elapsed_ms.max(0.0);
    let factor = 0.5_f64.powf(elapsed_ms / DECAY_HALF_LIFE_MS);
    clamp_confidence(MIN_CONFIDENCE + (confidence - MIN_CONFIDENCE) * factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_zero_elapsed_is_identity() {
        assert!((decay(0.8, 0.0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn decay_never_increases() {
        let c = 0.9;
        assert!(decay(c, 1000.0) <= c);
        assert!(decay(c, 1_000_000.0) <= c);
    }

    #[test]
    fn decay_is_monotone_in_elapsed_time() {
        let c = 0.9;
        let d1 = decay(c, 1_000.0);
        let d2 = decay(c, 10_000.0);
        assert!(d1 >= d2);
    }

    #[test]
    fn decay_asymptotes_to_floor() {
        let c = decay(1.0, DECAY_HALF_LIFE_MS * 50.0);
        assert!(c >= crate::types::MIN_CONFIDENCE);
        assert!((c - crate::types::MIN_CONFIDENCE).abs() < 1e-6);
    }

    #[test]
    fn reinforce_success_never_drops_more_than_point_zero_five() {
        for rating in [None, Some(SatisfactionRating::new(3)), Some(SatisfactionRating::new(5))] {
            let before = 0.6;
            let after = reinforce(before, Outcome::SuccessAuto, rating);
            assert!(after >= before - 0.05, "rating {rating:?} dropped too much");
        }
    }

    #[test]
    fn reinforce_failure_strictly_decreases_above_floor() {
        for rating in [None, Some(SatisfactionRating::new(1)), Some(SatisfactionRating::new(3))] {
            let before = 0.6;
            let after = reinforce(before, Outcome::FailedValidation, rating);
            assert!(after < before, "rating {rating:?} did not decrease");
        }
    }

    #[test]
    fn reinforce_failure_does_not_decrease_below_floor_itself() {
        let after = reinforce(0.1, Outcome::Rejected, None);
        assert!((after - 0.1).abs() < 1e-9);
    }

    #[test]
    fn reinforce_is_deterministic() {
        let a = reinforce(0.5, Outcome::SuccessHumanReview, Some(SatisfactionRating::new(4)));
        let b = reinforce(0.5, Outcome::SuccessHumanReview, Some(SatisfactionRating::new(4)));
        assert!((a - b).abs() < 1e-4);
    }

    #[test]
    fn reinforce_clamps_to_valid_range() {
        let after = reinforce(0.99, Outcome::SuccessAuto, None);
        assert!(after <= crate::types::MAX_CONFIDENCE);
        let after = reinforce(0.1, Outcome::FailedValidation, Some(SatisfactionRating::new(1)));
        assert!(after >= crate::types::MIN_CONFIDENCE);
    }
}
