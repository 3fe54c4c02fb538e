//! Output types of [`super::DuplicateDetector::check`] (spec §4.6).

/// Which scoring rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaType {
    /// Exact, case-sensitive invoice number equality.
    ExactInvoiceNumber,
    /// Fuzzy, Levenshtein-based invoice number similarity.
    FuzzyInvoiceNumber,
    /// Both sides carry a date within the configured proximity window.
    DateProximity,
    /// Both sides carry an amount within the configured tolerance.
    AmountTolerance,
}

/// One scoring criterion evaluated against a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingCriterion {
    /// Which rule this is.
    pub criteria_type: CriteriaType,
    /// Whether this criterion matched.
    pub matched: bool,
    /// The criterion's own confidence, in `[0, 1]`.
    pub confidence: f64,
}

/// A candidate invoice reported as a potential duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialDuplicate {
    /// The candidate's vendor.
    pub vendor_id: String,
    /// The candidate's invoice number.
    pub invoice_number: String,
    /// Days between the candidate's date and the query invoice's date, if
    /// both are known.
    pub days_difference: Option<i64>,
    /// The aggregate weighted similarity score.
    pub similarity_score: f64,
    /// Every criterion evaluated for this candidate.
    pub matching_criteria: Vec<MatchingCriterion>,
}

/// Severity of a [`ValidationIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Informational only.
    Info,
    /// Should be reviewed but does not block processing.
    Warning,
    /// Must be resolved before processing continues.
    Error,
}

/// A problem surfaced during duplicate checking, independent of whether
/// any duplicate was found (e.g. a storage failure).
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// How severe this issue is.
    pub severity: IssueSeverity,
    /// A short machine-friendly tag, e.g. `"storage_unavailable"`.
    pub issue_type: String,
    /// A human-readable description.
    pub description: String,
}

/// The full result of a `check` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCheckResult {
    /// Whether any candidate was reported as a potential duplicate.
    pub duplicates_found: bool,
    /// Candidates exceeding the reporting threshold.
    pub potential_duplicates: Vec<PotentialDuplicate>,
    /// Issues surfaced during the check.
    pub validation_issues: Vec<ValidationIssue>,
    /// Overall confidence in this result, in `[0, 1]`.
    pub confidence: f64,
    /// Non-empty human-readable summary.
    pub reasoning: String,
}
