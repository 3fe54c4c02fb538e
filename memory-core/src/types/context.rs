//! The context carried inside every memory envelope.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse difficulty bucket for an invoice's extraction/normalization task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    #[default]
    Moderate,
    Complex,
}

/// Characteristics of the invoice a memory was learned from or is being
/// matched against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCharacteristics {
    /// Task complexity bucket.
    pub complexity: ComplexityLevel,
    /// Document language, e.g. `"de"`, `"en"`.
    pub language: String,
    /// Source document format, e.g. `"pdf"`, `"scan"`, `"xml"`.
    pub document_format: String,
    /// OCR/extraction confidence, in `[0, 1]`.
    pub extraction_quality: f64,
}

impl Default for InvoiceCharacteristics {
    fn default() -> Self {
        Self {
            complexity: ComplexityLevel::Moderate,
            language: "en".to_string(),
            document_format: "pdf".to_string(),
            extraction_quality: 1.0,
        }
    }
}

/// The context a memory was captured under.
///
/// `historical_context` and `environmental_factors` are free-form,
/// string-keyed notes — callers outside the engines that produced them
/// should treat the values as opaque, mirroring the pattern-data opacity
/// note for `Pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MemoryContext {
    /// Vendor this memory is scoped to, if any.
    pub vendor_id: Option<String>,
    /// Characteristics of the invoice the memory was learned from.
    pub invoice_characteristics: InvoiceCharacteristics,
    /// Free-form historical notes (e.g. prior correction counts).
    pub historical_context: HashMap<String, String>,
    /// Free-form environmental notes (e.g. processing priority at capture time).
    pub environmental_factors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_characteristics_are_moderate_english_pdf() {
        let c = InvoiceCharacteristics::default();
        assert_eq!(c.complexity, ComplexityLevel::Moderate);
        assert_eq!(c.language, "en");
        assert_eq!(c.document_format, "pdf");
        assert!((c.extraction_quality - 1.0).abs() < 1e-9);
    }

    #[test]
    fn memory_context_serializes_round_trip() {
        let mut ctx = MemoryContext {
            vendor_id: Some("vendor-123".to_string()),
            ..Default::default()
        };
        ctx.historical_context
            .insert("priorCorrections".to_string(), "3".to_string());
        let json = serde_json::to_string(&ctx).expect("serialize");
        let back: MemoryContext = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(ctx, back);
    }
}
