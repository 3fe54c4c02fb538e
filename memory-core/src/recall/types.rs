//! Output types of a [`super::RecallEngine::recall`] call (spec §4.3).

use std::collections::HashMap;

use crate::types::{Memory, MemoryType};

/// How well a candidate memory's context matched the query context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextMatch {
    /// Whether the candidate's vendor equals the query's vendor.
    pub vendor_match: bool,
    /// Whether the candidate's language equals the query's language.
    pub language_match: bool,
    /// Whether the candidate's complexity bucket equals the query's.
    pub complexity_match: bool,
    /// Whether the candidate's recorded extraction quality is close to the
    /// query's.
    pub quality_match: bool,
    /// A single `[0, 1]` summary of the four comparisons above.
    pub similarity_score: f64,
}

/// One scored and ranked candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMemory {
    /// The candidate memory.
    pub memory: Memory,
    /// The final weighted score used to sort candidates.
    pub ranking_score: f64,
    /// The variant-specific relevance component.
    pub relevance_score: f64,
    /// The memory's own confidence, copied for convenience.
    pub confidence_score: f64,
    /// How recently the memory was used, in `[0, 1]`.
    pub recency_score: f64,
    /// The context-match breakdown this score was derived from.
    pub context_match: ContextMatch,
    /// A short human-readable explanation of why this memory was selected.
    pub selection_reason: String,
}

/// Aggregate statistics over a [`RecallResult`]'s ranked memories.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContextMatchStats {
    /// Number of ranked memories whose vendor matched exactly.
    pub exact_vendor_matches: usize,
    /// Number of ranked memories whose language matched.
    pub language_matches: usize,
    /// Count of ranked memories per [`MemoryType`].
    pub memory_type_distribution: HashMap<MemoryType, usize>,
}

/// The full result of a `recall` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallResult {
    /// Candidates, sorted descending by `ranking_score`, capped at
    /// `max_memories_per_query`.
    pub memories: Vec<RankedMemory>,
    /// Aggregate statistics over `memories`.
    pub context_match_stats: ContextMatchStats,
    /// Non-empty human-readable summary of the recall decision.
    pub reasoning: String,
}
