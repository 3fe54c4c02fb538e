//! The `ResolutionMemory` payload variant.

use serde::{Deserialize, Serialize};

/// A human decision resolving a detected discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanDecision {
    /// A short description of the decision taken.
    pub decision: String,
    /// The human's confidence in this decision, in `[0, 1]`.
    pub confidence: f64,
    /// Optional free-text rationale.
    pub rationale: Option<String>,
}

/// A weighted contextual factor considered while resolving a discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFactor {
    /// The factor name, e.g. `"vendor_relationship_length"`.
    pub factor: String,
    /// Its weight, typically in `[0, 1]`.
    pub weight: f64,
}

/// A learned resolution for a class of discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionMemory {
    /// The kind of discrepancy this resolution applies to, e.g.
    /// `"quantity_mismatch"`, `"price_variance"`.
    pub discrepancy_type: String,
    /// The outcome the resolution led to, e.g. `"accepted_vendor_amount"`.
    pub resolution_outcome: String,
    /// The human decision this resolution was learned from.
    pub human_decision: HumanDecision,
    /// Contextual factors weighed in the decision.
    pub context_factors: Vec<ContextFactor>,
}
