//! Property-based tests for the confidence manager and duplicate-detector
//! string similarity, covering the quantified invariants of spec §8 across
//! a wide range of generated inputs.

use invoice_memory_core::confidence::{decay, reinforce};
use invoice_memory_core::types::{Outcome, SatisfactionRating, MAX_CONFIDENCE, MIN_CONFIDENCE};
use proptest::prelude::*;
use strsim::normalized_levenshtein;

fn any_confidence() -> impl Strategy<Value = f64> {
    MIN_CONFIDENCE..=MAX_CONFIDENCE
}

fn any_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::SuccessAuto),
        Just(Outcome::SuccessHumanReview),
        Just(Outcome::FailedValidation),
        Just(Outcome::Rejected),
    ]
}

fn any_rating() -> impl Strategy<Value = Option<SatisfactionRating>> {
    prop_oneof![
        Just(None),
        (1u8..=5).prop_map(|v| Some(SatisfactionRating::new(v))),
    ]
}

proptest! {
    /// §8.1: reinforce never pushes confidence outside the memory-visible
    /// range, for any outcome and any optional rating.
    #[test]
    fn reinforce_always_stays_in_memory_visible_range(
        confidence in any_confidence(),
        outcome in any_outcome(),
        rating in any_rating(),
    ) {
        let result = reinforce(confidence, outcome, rating);
        prop_assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&result));
    }

    /// §8.5: a success outcome with non-negative (or absent) feedback
    /// never drops confidence by more than 0.05.
    #[test]
    fn reinforce_success_never_drops_more_than_point_zero_five(
        confidence in any_confidence(),
        success in prop_oneof![Just(Outcome::SuccessAuto), Just(Outcome::SuccessHumanReview)],
        rating in prop_oneof![Just(None), (3u8..=5).prop_map(|v| Some(SatisfactionRating::new(v)))],
    ) {
        let result = reinforce(confidence, success, rating);
        prop_assert!(result >= confidence - 0.05 - 1e-9);
    }

    /// §8.6: a failed/rejected outcome with non-positive feedback strictly
    /// decreases confidence whenever it starts above the floor.
    #[test]
    fn reinforce_failure_strictly_decreases_above_floor(
        confidence in (MIN_CONFIDENCE + 0.01)..=MAX_CONFIDENCE,
        failure in prop_oneof![Just(Outcome::FailedValidation), Just(Outcome::Rejected)],
        rating in prop_oneof![Just(None), (1u8..=3).prop_map(|v| Some(SatisfactionRating::new(v)))],
    ) {
        let result = reinforce(confidence, failure, rating);
        prop_assert!(result < confidence);
    }

    /// §8.4: decay never increases confidence and is monotone
    /// non-increasing in elapsed time, for any starting confidence and any
    /// pair of non-negative elapsed durations.
    #[test]
    fn decay_never_increases_and_is_monotone(
        confidence in any_confidence(),
        elapsed_a in 0.0f64..1_000_000_000.0,
        elapsed_b in 0.0f64..1_000_000_000.0,
    ) {
        let decayed = decay(confidence, elapsed_a);
        prop_assert!(decayed <= confidence + 1e-9);
        prop_assert!(decayed >= MIN_CONFIDENCE - 1e-9);

        let (shorter, longer) = if elapsed_a <= elapsed_b {
            (elapsed_a, elapsed_b)
        } else {
            (elapsed_b, elapsed_a)
        };
        prop_assert!(decay(confidence, shorter) >= decay(confidence, longer) - 1e-9);
    }

    /// §8.11: string similarity is reflexive, symmetric, and zero against
    /// the empty string for any non-empty input.
    #[test]
    fn string_similarity_is_reflexive_and_symmetric(
        a in "[A-Za-z0-9-]{0,20}",
        b in "[A-Za-z0-9-]{0,20}",
    ) {
        prop_assert!((normalized_levenshtein(&a, &a) - 1.0).abs() < 1e-9);
        prop_assert!((normalized_levenshtein(&a, &b) - normalized_levenshtein(&b, &a)).abs() < 1e-9);
        if !a.is_empty() {
            prop_assert_eq!(normalized_levenshtein(&a, ""), 0.0);
        }
    }
}
