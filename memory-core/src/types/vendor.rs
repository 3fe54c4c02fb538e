//! The `VendorMemory` payload variant.

use serde::{Deserialize, Serialize};

/// How a transformation from a source field value to a target field
/// value is carried out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    /// The kind of transformation, e.g. `"DATE_PARSING"`, `"DIRECT_COPY"`,
    /// `"NUMBER_PARSING"`.
    pub rule_type: String,
    /// Free-form parameters for the transformation (e.g. a date format
    /// string for `DATE_PARSING`).
    pub parameters: std::collections::HashMap<String, String>,
    /// Optional regex the source value must match for the rule to apply.
    pub validation_pattern: Option<String>,
}

impl TransformationRule {
    /// A direct-copy rule with no parameters.
    #[must_use]
    pub fn direct_copy() -> Self {
        Self {
            rule_type: "DIRECT_COPY".to_string(),
            parameters: std::collections::HashMap::new(),
            validation_pattern: None,
        }
    }

    /// A date-parsing rule with the given source format.
    #[must_use]
    pub fn date_parsing(source_format: impl Into<String>) -> Self {
        let mut parameters = std::collections::HashMap::new();
        parameters.insert("sourceFormat".to_string(), source_format.into());
        Self {
            rule_type: "DATE_PARSING".to_string(),
            parameters,
            validation_pattern: None,
        }
    }
}

/// One observed source→target mapping example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingExample {
    /// The raw source value, e.g. `"15.01.2024"`.
    pub source_value: String,
    /// The normalized target value, e.g. `"2024-01-15"`.
    pub target_value: String,
    /// Free-form context the example was observed under (e.g. invoice id).
    pub context: String,
}

/// A learned field mapping for one vendor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// The field name as it appears in the raw extraction, e.g.
    /// `"Leistungsdatum"`.
    pub source_field: String,
    /// The normalized field name, e.g. `"serviceDate"`.
    pub target_field: String,
    /// How to transform source values into target values.
    pub transformation_rule: TransformationRule,
    /// Confidence in this specific mapping, in `[0, 1]`.
    pub confidence: f64,
    /// Up to a handful of observed examples backing this mapping.
    pub examples: Vec<MappingExample>,
}

/// Maximum number of examples retained per [`FieldMapping`].
pub const MAX_EXAMPLES_PER_MAPPING: usize = 5;

impl FieldMapping {
    /// Push an example, dropping the oldest once
    /// [`MAX_EXAMPLES_PER_MAPPING`] is exceeded.
    pub fn push_example(&mut self, example: MappingExample) {
        self.examples.push(example);
        if self.examples.len() > MAX_EXAMPLES_PER_MAPPING {
            self.examples.remove(0);
        }
    }
}

/// Whether a vendor's quoted prices already include VAT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatBehavior {
    /// `true` when prices are quoted VAT-inclusive (majority of observed
    /// invoices used an inclusion indicator), per spec §4.4.
    pub vat_included_in_prices: bool,
    /// Most frequently observed VAT percentage, if any was detected.
    ///
    /// `None` means "no rate observed"; `Some(0.0)` means a detected 0%
    /// rate. See `DESIGN.md` Open Question 2.
    pub default_vat_rate: Option<f64>,
    /// Normalized inclusion/exclusion indicator strings observed across
    /// invoices (e.g. `"inkl. mwst"`, `"brutto"`).
    pub vat_inclusion_indicators: Vec<String>,
}

impl Default for VatBehavior {
    fn default() -> Self {
        Self {
            vat_included_in_prices: false,
            default_vat_rate: None,
            vat_inclusion_indicators: Vec::new(),
        }
    }
}

/// A regex family recognized for a currency representation, e.g. `€1.234,56`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyPattern {
    /// The regex pattern string.
    pub regex: String,
    /// ISO currency code this pattern matches, e.g. `"EUR"`.
    pub currency_code: String,
    /// Number of invoices this pattern was observed to match across.
    pub match_count: usize,
    /// Confidence in this pattern, in `[0, 1]`.
    pub confidence: f64,
}

/// A regex family recognized for a date representation, e.g. `DD.MM.YYYY`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateFormatPattern {
    /// The regex pattern string.
    pub regex: String,
    /// A human-readable format name, e.g. `"DD.MM.YYYY"`.
    pub format_name: String,
    /// Number of invoices this pattern was observed to match across.
    pub match_count: usize,
    /// Confidence in this pattern, in `[0, 1]`.
    pub confidence: f64,
}

/// Vendor-scoped extraction knowledge: field mappings, VAT behavior, and
/// currency/date format families.
///
/// Invariant (spec §3.2): `vendor_id` here must equal
/// `MemoryEnvelope.context.vendor_id` for the owning memory — enforced by
/// [`crate::types::Memory::new_vendor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorMemory {
    /// The vendor this memory is scoped to.
    pub vendor_id: String,
    /// Learned field mappings.
    pub field_mappings: Vec<FieldMapping>,
    /// Learned VAT behavior.
    pub vat_behavior: VatBehavior,
    /// Learned currency patterns.
    pub currency_patterns: Vec<CurrencyPattern>,
    /// Learned date formats.
    pub date_formats: Vec<DateFormatPattern>,
}

impl VendorMemory {
    /// Construct an empty vendor memory for the given vendor.
    #[must_use]
    pub fn new(vendor_id: impl Into<String>) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            field_mappings: Vec::new(),
            vat_behavior: VatBehavior::default(),
            currency_patterns: Vec::new(),
            date_formats: Vec::new(),
        }
    }
}
