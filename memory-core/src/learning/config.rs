//! Learning engine configuration (spec §6).

/// Default minimum group size before a correction pattern is recognized.
pub const DEFAULT_MIN_PATTERN_OCCURRENCES: usize = 3;
/// Default recognition window, in days, over which corrections are mined.
pub const DEFAULT_PATTERN_RECOGNITION_WINDOW_DAYS: i64 = 30;
/// Default minimum confidence a newly mined memory must reach to be kept.
pub const DEFAULT_MIN_NEW_MEMORY_CONFIDENCE: f64 = 0.4;
/// Default cap on memories emitted per learning call.
pub const DEFAULT_MAX_MEMORIES_PER_SESSION: usize = 10;
/// Default learning rate, used by reinforcement bookkeeping.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
/// Default consistency threshold for a non-date pattern to be accepted.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Tunable parameters for [`super::LearningEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct LearningConfig {
    /// Minimum number of similar corrections before a pattern is mined.
    pub min_pattern_occurrences: usize,
    /// How many days back corrections are considered for pattern mining.
    pub pattern_recognition_window_days: i64,
    /// Minimum confidence a newly mined memory must reach to be kept.
    pub min_new_memory_confidence: f64,
    /// Maximum number of memories emitted per `learn` call.
    pub max_memories_per_session: usize,
    /// Whether vendor-specific learning (feeding the recognizer) runs.
    pub enable_vendor_specific_learning: bool,
    /// Whether correction-pattern mining runs.
    pub enable_correction_pattern_learning: bool,
    /// Whether resolution learning runs.
    pub enable_resolution_learning: bool,
    /// The learning rate used by reinforcement bookkeeping.
    pub learning_rate: f64,
    /// Minimum value consistency for a non-date pattern to be accepted.
    pub similarity_threshold: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_pattern_occurrences: DEFAULT_MIN_PATTERN_OCCURRENCES,
            pattern_recognition_window_days: DEFAULT_PATTERN_RECOGNITION_WINDOW_DAYS,
            min_new_memory_confidence: DEFAULT_MIN_NEW_MEMORY_CONFIDENCE,
            max_memories_per_session: DEFAULT_MAX_MEMORIES_PER_SESSION,
            enable_vendor_specific_learning: true,
            enable_correction_pattern_learning: true,
            enable_resolution_learning: true,
            learning_rate: DEFAULT_LEARNING_RATE,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = LearningConfig::default();
        assert_eq!(config.min_pattern_occurrences, 3);
        assert_eq!(config.pattern_recognition_window_days, 30);
        assert!((config.min_new_memory_confidence - 0.4).abs() < 1e-9);
        assert_eq!(config.max_memories_per_session, 10);
        assert!(config.enable_vendor_specific_learning);
        assert!(config.enable_correction_pattern_learning);
        assert!(config.enable_resolution_learning);
        assert!((config.learning_rate - 0.1).abs() < 1e-9);
        assert!((config.similarity_threshold - 0.6).abs() < 1e-9);
    }
}
