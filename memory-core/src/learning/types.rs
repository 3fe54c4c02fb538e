//! Inputs and outputs of the [`super::LearningEngine`] (spec §4.5).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{ContextFactor, HumanDecision, MemoryType};

/// Which strategy a `learn` call should use to turn corrections into
/// memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LearningStrategy {
    /// One `CorrectionMemory` per correction, no grouping.
    Immediate,
    /// Group corrections with equal `(field, corrected_value)`, emit one
    /// memory per group of two or more.
    Batch,
    /// Mine patterns first; corrections not covered by any pattern fall
    /// back to [`LearningStrategy::Immediate`].
    #[default]
    PatternBased,
}

/// The coarse kind of value a corrected field holds, used to group
/// corrections for pattern mining (spec §4.5 "Pattern mining").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// A numeric amount or quantity.
    Numeric,
    /// A date-valued field.
    Date,
    /// Anything else.
    Text,
}

impl ValueKind {
    /// Classify a normalized field name into its value kind, matching
    /// the same field groupings [`crate::types::CorrectionType::for_field`]
    /// uses.
    #[must_use]
    pub fn for_field(field: &str) -> Self {
        match field {
            "totalAmount" | "quantity" | "vatAmount" => ValueKind::Numeric,
            "serviceDate" | "invoiceDate" | "dueDate" => ValueKind::Date,
            _ => ValueKind::Text,
        }
    }
}

/// One observed human correction.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanCorrection {
    /// The normalized field the correction applies to.
    pub field: String,
    /// The value before correction, if known.
    pub original_value: Option<String>,
    /// The value a human corrected it to.
    pub corrected_value: String,
}

/// A full processing outcome with human feedback (spec §4.5 input (b)):
/// a discrepancy a human resolved during review, to be generalized into a
/// [`crate::types::ResolutionMemory`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResolution {
    /// The kind of discrepancy that was resolved, e.g. `"vat_mismatch"`.
    pub discrepancy_type: String,
    /// What the resolution settled on, e.g. `"accepted_vendor_amount"`.
    pub resolution_outcome: String,
    /// The human decision this resolution was learned from.
    pub human_decision: HumanDecision,
    /// Contextual factors weighed in the decision.
    pub context_factors: Vec<ContextFactor>,
}

/// One entry in a [`LearningOutcome`]'s result list.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningResult {
    /// Which kind of memory this result produced or attempted.
    pub memory_type: MemoryType,
    /// The id of the memory created, if successful.
    pub memory_id: Option<Uuid>,
    /// The confidence the memory was created or reinforced with.
    pub confidence: f64,
    /// Indices into the input corrections slice that produced this result.
    pub source_corrections: Vec<usize>,
    /// The mined pattern's type tag, if this result came from pattern
    /// mining rather than immediate/batch grouping.
    pub pattern: Option<String>,
    /// Whether this result succeeded.
    pub success: bool,
    /// An error description, if `success` is `false`.
    pub error_message: Option<String>,
}

/// The full reported outcome of a `learn` call (spec §4.5 "Outcome").
#[derive(Debug, Clone, PartialEq)]
pub struct LearningOutcome {
    /// A fresh id identifying this learning session.
    pub session_id: Uuid,
    /// When this outcome was produced.
    pub timestamp: DateTime<Utc>,
    /// The strategy used.
    pub strategy: LearningStrategy,
    /// Number of corrections given as input.
    pub corrections_processed: usize,
    /// Number of new memories created.
    pub memories_created: usize,
    /// Number of existing memories reinforced.
    pub memories_reinforced: usize,
    /// Number of patterns recognized during mining.
    pub patterns_recognized: usize,
    /// Mean confidence across successful results.
    pub learning_confidence: f64,
    /// Per-result detail.
    pub learning_results: Vec<LearningResult>,
    /// Non-empty human-readable summary, including corrections count,
    /// learning counts, and success rate (spec §4.5).
    pub reasoning: String,
}
