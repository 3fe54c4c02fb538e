//! Recall engine configuration (spec §6).

/// Default cap on memories returned per query.
pub const DEFAULT_MAX_MEMORIES_PER_QUERY: usize = 20;
/// Default minimum relevance a candidate must clear to be ranked at all.
pub const DEFAULT_MIN_RELEVANCE_THRESHOLD: f64 = 0.1;
/// Default weight on `confidenceScore` in `rankingScore`.
pub const DEFAULT_CONFIDENCE_WEIGHT: f64 = 0.4;
/// Default weight on `relevanceScore` in `rankingScore`.
pub const DEFAULT_RELEVANCE_WEIGHT: f64 = 0.4;
/// Default weight on `recencyScore` in `rankingScore`.
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.2;

/// Tunable parameters for [`super::RecallEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecallConfig {
    /// Maximum number of memories returned from a single `recall` call.
    pub max_memories_per_query: usize,
    /// Candidates scoring below this relevance are dropped before ranking.
    pub min_relevance_threshold: f64,
    /// Weight on confidence in the weighted ranking score.
    pub confidence_weight: f64,
    /// Weight on relevance in the weighted ranking score.
    pub relevance_weight: f64,
    /// Weight on recency in the weighted ranking score.
    pub recency_weight: f64,
    /// Whether vendor-scoped candidates should be fetched alongside the
    /// cross-vendor candidate pool.
    pub enable_vendor_prioritization: bool,
    /// Whether candidates are filtered by pattern match before scoring.
    pub enable_pattern_filtering: bool,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            max_memories_per_query: DEFAULT_MAX_MEMORIES_PER_QUERY,
            min_relevance_threshold: DEFAULT_MIN_RELEVANCE_THRESHOLD,
            confidence_weight: DEFAULT_CONFIDENCE_WEIGHT,
            relevance_weight: DEFAULT_RELEVANCE_WEIGHT,
            recency_weight: DEFAULT_RECENCY_WEIGHT,
            enable_vendor_prioritization: true,
            enable_pattern_filtering: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RecallConfig::default();
        assert_eq!(config.max_memories_per_query, 20);
        assert!((config.min_relevance_threshold - 0.1).abs() < 1e-9);
        assert!((config.confidence_weight - 0.4).abs() < 1e-9);
        assert!((config.relevance_weight - 0.4).abs() < 1e-9);
        assert!((config.recency_weight - 0.2).abs() < 1e-9);
        assert!(config.enable_vendor_prioritization);
        assert!(config.enable_pattern_filtering);
    }
}
