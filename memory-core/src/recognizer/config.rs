//! Vendor pattern recognizer configuration (spec §6).

/// Default minimum confidence for a synthesized pattern to be kept.
pub const DEFAULT_MIN_PATTERN_CONFIDENCE: f64 = 0.6;
/// Default minimum number of observed examples before a pattern is retained.
pub const DEFAULT_MIN_EXAMPLES_FOR_PATTERN: usize = 2;
/// Default maximum age, in days, of an example still eligible to count.
pub const DEFAULT_MAX_EXAMPLE_AGE_DAYS: i64 = 90;
/// Default confidence boost applied to a vendor-specific field mapping.
pub const DEFAULT_VENDOR_SPECIFIC_BOOST: f64 = 0.2;

/// Tunable parameters for [`super::VendorPatternRecognizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
    /// Minimum confidence a pattern must reach to be kept.
    pub min_pattern_confidence: f64,
    /// Minimum number of observed examples before a currency/date pattern
    /// family is retained.
    pub min_examples_for_pattern: usize,
    /// Examples older than this are excluded from pattern mining.
    pub max_example_age_days: i64,
    /// Whether VAT inclusion/exclusion detection runs.
    pub enable_vat_detection: bool,
    /// Whether currency pattern learning runs.
    pub enable_currency_learning: bool,
    /// Whether date format pattern learning runs.
    pub enable_date_format_learning: bool,
    /// Confidence boost applied to vendor-specific field mappings.
    pub vendor_specific_boost: f64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            min_pattern_confidence: DEFAULT_MIN_PATTERN_CONFIDENCE,
            min_examples_for_pattern: DEFAULT_MIN_EXAMPLES_FOR_PATTERN,
            max_example_age_days: DEFAULT_MAX_EXAMPLE_AGE_DAYS,
            enable_vat_detection: true,
            enable_currency_learning: true,
            enable_date_format_learning: true,
            vendor_specific_boost: DEFAULT_VENDOR_SPECIFIC_BOOST,
        }
    }
}
