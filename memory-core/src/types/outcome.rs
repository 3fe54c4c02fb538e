//! Outcomes reported back to the confidence manager and learning engine.

use serde::{Deserialize, Serialize};

/// The result of applying a memory (or a batch of corrections) to a real
/// invoice, as reported by the upstream pipeline once a human or
/// automated check has weighed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Applied automatically and accepted without human review.
    SuccessAuto,
    /// Applied and accepted after human review.
    SuccessHumanReview,
    /// Applied but failed downstream validation.
    FailedValidation,
    /// Rejected by a human reviewer.
    Rejected,
}

impl Outcome {
    /// Whether this outcome counts as a success for reinforcement
    /// purposes (spec §4.2/§8.5–§8.6).
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::SuccessAuto | Outcome::SuccessHumanReview)
    }
}

/// Optional human satisfaction rating accompanying an [`Outcome`], 1–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionRating(u8);

impl SatisfactionRating {
    /// Construct a rating, clamped to the valid `1..=5` range.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 5))
    }

    /// The raw rating value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this rating counts as non-negative feedback (`>= 3`), the
    /// threshold used throughout the confidence manager.
    #[must_use]
    pub fn is_non_negative(self) -> bool {
        self.0 >= 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_outcomes_are_success() {
        assert!(Outcome::SuccessAuto.is_success());
        assert!(Outcome::SuccessHumanReview.is_success());
        assert!(!Outcome::FailedValidation.is_success());
        assert!(!Outcome::Rejected.is_success());
    }

    #[test]
    fn rating_clamps_to_valid_range() {
        assert_eq!(SatisfactionRating::new(0).value(), 1);
        assert_eq!(SatisfactionRating::new(10).value(), 5);
        assert_eq!(SatisfactionRating::new(3).value(), 3);
    }

    #[test]
    fn rating_non_negative_threshold() {
        assert!(SatisfactionRating::new(3).is_non_negative());
        assert!(!SatisfactionRating::new(2).is_non_negative());
    }
}
