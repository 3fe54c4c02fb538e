//! Duplicate detector configuration (spec §6).

/// Default day window for a date-proximity match.
pub const DEFAULT_DATE_PROXIMITY_DAYS: i64 = 7;
/// Default fuzzy invoice-number similarity threshold.
pub const DEFAULT_FUZZY_MATCH_THRESHOLD: f64 = 0.85;
/// Default amount tolerance, as a percentage.
pub const DEFAULT_AMOUNT_TOLERANCE_PERCENT: f64 = 5.0;

/// Tunable parameters for [`super::DuplicateDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateDetectorConfig {
    /// Maximum days apart for a date-proximity match.
    pub date_proximity_days: i64,
    /// Whether fuzzy invoice-number matching runs.
    pub enable_fuzzy_matching: bool,
    /// Minimum normalized-Levenshtein similarity for a fuzzy match.
    pub fuzzy_match_threshold: f64,
    /// Whether amount-tolerance comparison runs.
    pub enable_amount_comparison: bool,
    /// Maximum relative amount difference, as a percentage, for a match.
    pub amount_tolerance_percent: f64,
}

impl Default for DuplicateDetectorConfig {
    fn default() -> Self {
        Self {
            date_proximity_days: DEFAULT_DATE_PROXIMITY_DAYS,
            enable_fuzzy_matching: true,
            fuzzy_match_threshold: DEFAULT_FUZZY_MATCH_THRESHOLD,
            enable_amount_comparison: true,
            amount_tolerance_percent: DEFAULT_AMOUNT_TOLERANCE_PERCENT,
        }
    }
}
