//! Inputs to the [`super::VendorPatternRecognizer`] (spec §4.4).

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One field as the (out-of-scope) OCR/extraction collaborator reported
/// it: its raw value and the extractor's own confidence in that value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedField {
    /// The raw, pre-normalization value, e.g. `"15.01.2024"`.
    pub value: String,
    /// The extractor's confidence in this value, in `[0, 1]`.
    pub confidence: f64,
}

/// One raw invoice observed for a vendor: its extracted field names (as
/// they appeared in the source document, prior to normalization) and its
/// raw text, used to mine field mappings, VAT behavior, and format
/// families.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInvoiceObservation {
    /// Extracted field name → extracted value, keyed by the *source*
    /// field name (e.g. `"Leistungsdatum" -> {value: "15.01.2024", ..}`).
    pub extracted_fields: HashMap<String, ExtractedField>,
    /// The full raw document text, used for VAT indicator and currency
    /// regex scanning.
    pub raw_text: String,
    /// When this invoice was observed.
    pub observed_at: DateTime<Utc>,
}

/// A human correction observed for a vendor, treated as a candidate
/// field-mapping source.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionObservation {
    /// The normalized target field the correction applies to.
    pub field: String,
    /// The value a human corrected it to.
    pub corrected_value: String,
    /// The raw source value the correction replaced, if known.
    pub source_value: Option<String>,
}
