//! # Duplicate Detector
//!
//! Flags candidate duplicate invoices under vendor + number +
//! date-proximity + fuzzy rules (spec §4.6).

pub mod config;
mod history;
mod types;

pub use config::DuplicateDetectorConfig;
pub use history::{InMemoryInvoiceHistory, InvoiceHistory};
pub use types::{
    CriteriaType, DuplicateCheckResult, IssueSeverity, MatchingCriterion, PotentialDuplicate,
    ValidationIssue,
};

use std::sync::Arc;

use strsim::normalized_levenshtein;
use tracing::{instrument, warn};

use crate::audit::{AuditLog, AuditOperation};
use crate::types::InvoiceRef;

/// A candidate is reported as a potential duplicate once its aggregate
/// similarity score crosses this threshold (spec §4.6: "exceeds an
/// implementation threshold").
const REPORTING_THRESHOLD: f64 = 0.5;

/// Checks a new invoice against prior invoices for the same vendor.
pub struct DuplicateDetector {
    history: Arc<dyn InvoiceHistory>,
    config: DuplicateDetectorConfig,
    audit: AuditLog,
}

impl DuplicateDetector {
    /// Construct a detector over `history`.
    #[must_use]
    pub fn new(history: Arc<dyn InvoiceHistory>, config: DuplicateDetectorConfig) -> Self {
        Self {
            history,
            config,
            audit: AuditLog::new(),
        }
    }

    /// The audit trail of every call made through this detector.
    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Check `invoice` for duplicates among prior invoices from the same
    /// vendor. Never returns an error: a storage failure degrades to a
    /// "no duplicates, low confidence" result with a validation issue
    /// describing the failure (spec §4.6 "On storage failure").
    #[instrument(skip(self, invoice), fields(vendor_id = %invoice.vendor_id))]
    pub async fn check(&self, invoice: &InvoiceRef, now: chrono::DateTime<chrono::Utc>) -> DuplicateCheckResult {
        let started = std::time::Instant::now();

        let candidates = match self.history.invoices_for_vendor(&invoice.vendor_id).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invoice history lookup failed");
                let result = DuplicateCheckResult {
                    duplicates_found: false,
                    potential_duplicates: vec![],
                    validation_issues: vec![ValidationIssue {
                        severity: IssueSeverity::Error,
                        issue_type: "storage_unavailable".to_string(),
                        description: format!("invoice history lookup failed: {e}"),
                    }],
                    confidence: 0.1,
                    reasoning: format!("duplicate check degraded: {e}"),
                };
                self.audit.push(
                    AuditOperation::ErrorHandling,
                    "DuplicateDetector",
                    "invoice history lookup failed",
                    format!("vendor_id={}", invoice.vendor_id),
                    "degraded result returned",
                    started.elapsed().as_millis() as u64,
                    now,
                );
                return result;
            }
        };

        let mut potential_duplicates = Vec::new();
        for candidate in &candidates {
            let (score, criteria) = self.score_candidate(invoice, candidate);
            if score > REPORTING_THRESHOLD {
                potential_duplicates.push(PotentialDuplicate {
                    vendor_id: candidate.vendor_id.clone(),
                    invoice_number: candidate.invoice_number.clone(),
                    days_difference: invoice.days_difference(candidate),
                    similarity_score: score,
                    matching_criteria: criteria,
                });
            }
        }

        potential_duplicates.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let duplicates_found = !potential_duplicates.is_empty();
        let confidence = potential_duplicates
            .first()
            .map_or(0.8, |d| d.similarity_score);

        let reasoning = format!(
            "checked {} candidates for vendor {}; found {} potential duplicates",
            candidates.len(),
            invoice.vendor_id,
            potential_duplicates.len()
        );

        self.audit.push(
            AuditOperation::Validation,
            "DuplicateDetector",
            "checked invoice against prior history",
            format!("vendor_id={} invoice_number={}", invoice.vendor_id, invoice.invoice_number),
            format!("duplicates_found={duplicates_found}"),
            started.elapsed().as_millis() as u64,
            now,
        );

        let validation_issues = if duplicates_found {
            vec![ValidationIssue {
                severity: IssueSeverity::Warning,
                issue_type: "potential_duplicate".to_string(),
                description: format!(
                    "{} candidate(s) resemble a prior invoice for vendor {}",
                    potential_duplicates.len(),
                    invoice.vendor_id
                ),
            }]
        } else {
            vec![]
        };

        DuplicateCheckResult {
            duplicates_found,
            potential_duplicates,
            validation_issues,
            confidence,
            reasoning,
        }
    }

    fn score_candidate(
        &self,
        invoice: &InvoiceRef,
        candidate: &InvoiceRef,
    ) -> (f64, Vec<MatchingCriterion>) {
        let mut criteria = Vec::new();
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut date_gate_failed = false;

        let exact_match = invoice.invoice_number == candidate.invoice_number;
        criteria.push(MatchingCriterion {
            criteria_type: CriteriaType::ExactInvoiceNumber,
            matched: exact_match,
            confidence: if exact_match { 1.0 } else { 0.0 },
        });
        weighted_sum += if exact_match { 1.0 } else { 0.0 } * 0.4;
        weight_total += 0.4;

        if self.config.enable_fuzzy_matching {
            let similarity = normalized_levenshtein(&invoice.invoice_number, &candidate.invoice_number);
            let matched = similarity >= self.config.fuzzy_match_threshold;
            criteria.push(MatchingCriterion {
                criteria_type: CriteriaType::FuzzyInvoiceNumber,
                matched,
                confidence: similarity,
            });
            weighted_sum += similarity * 0.3;
            weight_total += 0.3;
        }

        if let Some(days) = invoice.days_difference(candidate) {
            let matched = days <= self.config.date_proximity_days;
            if !matched {
                date_gate_failed = true;
            }
            let confidence = if matched {
                (1.0 - days as f64 / (self.config.date_proximity_days.max(1) as f64 + 1.0)).max(0.0)
            } else {
                0.0
            };
            criteria.push(MatchingCriterion {
                criteria_type: CriteriaType::DateProximity,
                matched,
                confidence,
            });
            weighted_sum += confidence * 0.2;
            weight_total += 0.2;
        }

        if self.config.enable_amount_comparison {
            if let (Some(a), Some(b)) = (invoice.amount, candidate.amount) {
                if a != 0.0 {
                    let relative_diff = ((a - b).abs() / a.abs()) * 100.0;
                    let matched = relative_diff <= self.config.amount_tolerance_percent;
                    let confidence = if matched {
                        (1.0 - relative_diff / self.config.amount_tolerance_percent.max(f64::EPSILON)).max(0.0)
                    } else {
                        0.0
                    };
                    criteria.push(MatchingCriterion {
                        criteria_type: CriteriaType::AmountTolerance,
                        matched,
                        confidence,
                    });
                    weighted_sum += confidence * 0.1;
                    weight_total += 0.1;
                }
            }
        }

        // A date outside the proximity window rules out a duplicate outright
        // (spec §8 invariant 12): it gates the whole score rather than just
        // losing its own weighted addend, so an exact invoice-number match
        // can't paper over it.
        let score = if date_gate_failed {
            0.0
        } else if weight_total > 0.0 {
            (weighted_sum / weight_total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        (score, criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn invoice(vendor_id: &str, invoice_number: &str, date: &str) -> InvoiceRef {
        InvoiceRef {
            vendor_id: vendor_id.to_string(),
            invoice_number: invoice_number.to_string(),
            invoice_date: date.parse().ok(),
            amount: None,
        }
    }

    #[tokio::test]
    async fn exact_match_within_same_vendor_is_reported() {
        let history = Arc::new(InMemoryInvoiceHistory::new());
        history.record(invoice("vendor-1", "INV-2024-001", "2024-01-15"));

        let detector = DuplicateDetector::new(history, DuplicateDetectorConfig::default());
        let result = detector
            .check(&invoice("vendor-1", "INV-2024-001", "2024-01-15"), Utc::now())
            .await;

        assert!(result.duplicates_found);
        assert_eq!(result.potential_duplicates.len(), 1);
        assert!(result.potential_duplicates[0].similarity_score > 0.9);
        assert_eq!(result.validation_issues.len(), 1);
        assert_eq!(result.validation_issues[0].severity, IssueSeverity::Warning);
    }

    #[tokio::test]
    async fn different_vendor_never_surfaces_as_candidate() {
        let history = Arc::new(InMemoryInvoiceHistory::new());
        history.record(invoice("vendor-2", "INV-2024-001", "2024-01-15"));

        let detector = DuplicateDetector::new(history, DuplicateDetectorConfig::default());
        let result = detector
            .check(&invoice("vendor-1", "INV-2024-001", "2024-01-15"), Utc::now())
            .await;

        assert!(!result.duplicates_found);
    }

    #[tokio::test]
    async fn date_outside_proximity_window_and_different_number_is_not_a_duplicate() {
        let history = Arc::new(InMemoryInvoiceHistory::new());
        history.record(invoice("vendor-1", "INV-DIFFERENT", "2023-01-01"));

        let detector = DuplicateDetector::new(history, DuplicateDetectorConfig::default());
        let result = detector
            .check(&invoice("vendor-1", "INV-OTHER", "2024-06-01"), Utc::now())
            .await;

        assert!(!result.duplicates_found);
    }

    #[tokio::test]
    async fn date_outside_proximity_window_gates_out_even_an_exact_invoice_number_match() {
        let history = Arc::new(InMemoryInvoiceHistory::new());
        history.record(invoice("vendor-1", "INV-2024-001", "2023-01-01"));

        let detector = DuplicateDetector::new(history, DuplicateDetectorConfig::default());
        let result = detector
            .check(&invoice("vendor-1", "INV-2024-001", "2024-06-01"), Utc::now())
            .await;

        assert!(!result.duplicates_found);
    }

    #[test]
    fn string_similarity_matches_documented_properties() {
        assert!((normalized_levenshtein("", "") - 1.0).abs() < 1e-9);
        assert_eq!(normalized_levenshtein("x", ""), 0.0);
        assert!((normalized_levenshtein("x", "x") - 1.0).abs() < 1e-9);
        assert!(normalized_levenshtein("INV-2024-001", "INV-2024-001A") > 0.8);
        assert!(normalized_levenshtein("INV-2024-001", "PO-2023-999") < 0.5);
    }
}
