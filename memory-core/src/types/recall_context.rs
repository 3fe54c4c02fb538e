//! The input to the recall engine (spec §4.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::invoice::InvoiceRef;

/// How long the vendor relationship has been in place, coarsely bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    New,
    #[default]
    Occasional,
    Regular,
    Strategic,
}

/// Vendor identity and relationship context for a recall query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorInfo {
    /// The vendor's stable identifier.
    pub id: String,
    /// The vendor's display name.
    pub name: String,
    /// The vendor's document language.
    pub language: String,
    /// How established the relationship with this vendor is.
    pub relationship_type: RelationshipType,
}

/// Processing urgency for the current invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// The environment a recall query is issued under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// The single, sampled-once wall-clock timestamp for this query
    /// (spec §4.3 Determinism: "a single `now` is sampled once per call").
    pub timestamp: DateTime<Utc>,
    /// Processing urgency.
    pub priority: Priority,
    /// Optional free-text deadline/time-budget note.
    pub time_constraints: Option<String>,
    /// Optional free-text regulatory jurisdiction note.
    pub regulatory_context: Option<String>,
}

/// One entry in a recall query's history (e.g. a prior processing note).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// A short description of the historical event.
    pub description: String,
    /// When it occurred.
    pub occurred_at: DateTime<Utc>,
}

/// The full context supplied to [`crate::recall::RecallEngine::recall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceContext {
    /// The invoice being processed.
    pub invoice: InvoiceRef,
    /// Vendor identity and relationship info.
    pub vendor_info: VendorInfo,
    /// Processing environment.
    pub environment: Environment,
    /// Prior processing history relevant to this invoice or vendor.
    pub history: Vec<HistoryEntry>,
    /// Document language (mirrors `vendor_info.language` for convenience;
    /// kept separate so recall can match on invoice-level language
    /// overrides distinct from the vendor's default language).
    pub language: String,
    /// Task complexity bucket for this invoice.
    pub complexity: super::context::ComplexityLevel,
    /// OCR/extraction confidence for this invoice, in `[0, 1]`.
    pub extraction_quality: f64,
}
