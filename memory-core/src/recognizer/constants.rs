//! Known-table constants for German invoice field recognition (spec §4.4).
//!
//! Grounded in the teacher's module-level constant-array convention
//! (`memory-core/src/constants.rs`).

/// Known German source field → normalized target field pairs. Matched
/// case-insensitively as a substring of the extracted field name.
pub const FIELD_MAPPINGS: &[(&str, &str)] = &[
    ("Leistungsdatum", "serviceDate"),
    ("Rechnungsdatum", "invoiceDate"),
    ("Fälligkeitsdatum", "dueDate"),
    ("Rechnungsnummer", "invoiceNumber"),
    ("Bestellnummer", "purchaseOrderNumber"),
    ("Gesamtbetrag", "totalAmount"),
    ("MwSt", "vatAmount"),
    ("Nettobetrag", "netAmount"),
];

/// Lowercase substrings indicating VAT-inclusive pricing.
pub const VAT_INCLUSION_INDICATORS: &[&str] = &[
    "mwst. inkl.",
    "inkl. mwst",
    "preise inkl. mwst",
    "brutto",
    "prices incl. vat",
];

/// Lowercase substrings indicating VAT-exclusive pricing.
pub const VAT_EXCLUSION_INDICATORS: &[&str] = &[
    "zzgl. mwst",
    "netto",
    "excl. mwst",
    "prices excl. vat",
];

/// Regex family recognizing a Euro-denominated currency amount, e.g.
/// `€1.234,56` or `1.234,56 EUR`.
pub const EUR_CURRENCY_REGEX: &str = r"(?:€\s?\d{1,3}(?:\.\d{3})*,\d{2}|\d{1,3}(?:\.\d{3})*,\d{2}\s?EUR)";

/// Named date-format regex families recognized across invoices.
pub const DATE_FORMAT_PATTERNS: &[(&str, &str)] = &[
    ("DD.MM.YYYY", r"\b\d{2}\.\d{2}\.\d{4}\b"),
    ("DD.MM.YY", r"\b\d{2}\.\d{2}\.\d{2}\b"),
    ("DD/MM/YYYY", r"\b\d{2}/\d{2}/\d{4}\b"),
    ("YYYY-MM-DD", r"\b\d{4}-\d{2}-\d{2}\b"),
];

/// Regex matching a percentage near a VAT indicator, e.g. `19% MwSt`.
pub const VAT_RATE_REGEX: &str = r"(\d{1,2}(?:[.,]\d+)?)\s?%\s?(?:mwst|vat)";
