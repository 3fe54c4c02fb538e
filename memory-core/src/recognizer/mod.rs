//! # Vendor Pattern Recognizer
//!
//! Turns raw and historical invoices for one vendor into a
//! [`crate::types::VendorMemory`]: field mappings, VAT behavior, currency
//! and date format families (spec §4.4).
//!
//! Vendor isolation is the load-bearing contract here: [`isolate`] never
//! returns a memory belonging to any vendor but the one asked for, even
//! under concurrent writes, because every finder goes through
//! [`crate::storage::StorageBackend::find_by_vendor`] rather than an
//! in-process cache (spec §5 "no in-process caches of memories").

mod constants;
pub mod config;
mod types;

pub use config::RecognizerConfig;
pub use types::{CorrectionObservation, ExtractedField, RawInvoiceObservation};

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{instrument, warn};

use crate::audit::{AuditLog, AuditOperation};
use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::{
    CurrencyPattern, DateFormatPattern, FieldMapping, MappingExample, MemoryType,
    TransformationRule, VatBehavior, VendorMemory,
};

/// Baseline confidence assigned to a recognized field mapping before the
/// vendor-specific boost is applied (spec §4.4).
const BASE_FIELD_CONFIDENCE: f64 = 0.6;

/// Learns and merges [`VendorMemory`] knowledge from raw observations.
pub struct VendorPatternRecognizer {
    storage: Arc<dyn StorageBackend>,
    config: RecognizerConfig,
    audit: AuditLog,
}

impl VendorPatternRecognizer {
    /// Construct a recognizer over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, config: RecognizerConfig) -> Self {
        Self {
            storage,
            config,
            audit: AuditLog::new(),
        }
    }

    /// The audit trail of every call made through this recognizer.
    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Return exactly the vendor memories scoped to `vendor_id`; never a
    /// memory belonging to another vendor (spec §4.4 isolation contract).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Storage`] on a storage failure.
    #[instrument(skip(self))]
    pub async fn isolate(&self, vendor_id: &str) -> Result<Vec<crate::types::Memory>> {
        let candidates = self.storage.find_by_vendor(vendor_id).await?;
        Ok(candidates
            .into_iter()
            .filter(|m| m.envelope.memory_type == MemoryType::Vendor)
            .filter(|m| {
                m.payload
                    .as_vendor()
                    .is_some_and(|v| v.vendor_id == vendor_id)
            })
            .collect())
    }

    /// Mine a fresh [`VendorMemory`] from observations, returning it
    /// alongside the overall fused confidence (spec §4.4 "Confidence
    /// fusion").
    #[must_use]
    pub fn analyze(
        &self,
        vendor_id: &str,
        observations: &[RawInvoiceObservation],
        corrections: &[CorrectionObservation],
    ) -> (VendorMemory, f64) {
        let mut memory = VendorMemory::new(vendor_id);
        let mut fired = Vec::new();

        let mapping_confidence = self.mine_field_mappings(&mut memory, observations, corrections);
        if let Some(c) = mapping_confidence {
            fired.push(c);
        }

        if self.config.enable_vat_detection {
            if let Some(c) = self.mine_vat_behavior(&mut memory, observations) {
                fired.push(c);
            }
        }

        if self.config.enable_currency_learning {
            if let Some(c) = self.mine_currency_patterns(&mut memory, observations) {
                fired.push(c);
            }
        }

        if self.config.enable_date_format_learning {
            if let Some(c) = self.mine_date_formats(&mut memory, observations) {
                fired.push(c);
            }
        }

        let overall = if fired.is_empty() {
            0.0
        } else {
            fired.iter().sum::<f64>() / fired.len() as f64
        };

        (memory, overall)
    }

    fn mine_field_mappings(
        &self,
        memory: &mut VendorMemory,
        observations: &[RawInvoiceObservation],
        corrections: &[CorrectionObservation],
    ) -> Option<f64> {
        let mut confidences = Vec::new();

        for obs in observations {
            for (source_field, field) in &obs.extracted_fields {
                let lower = source_field.to_lowercase();
                let known_mapping = constants::FIELD_MAPPINGS
                    .iter()
                    .find(|(known, _)| lower.contains(&known.to_lowercase()))
                    .copied();
                if let Some((known_source, target)) = known_mapping {
                    // spec §4.4: "final confidence = field.confidence +
                    // vendorSpecificBoost".
                    let confidence = (field.confidence + self.config.vendor_specific_boost).min(1.0);
                    confidences.push(confidence);
                    self.upsert_mapping(
                        memory,
                        known_source,
                        target,
                        confidence,
                        MappingExample {
                            source_value: field.value.clone(),
                            target_value: field.value.clone(),
                            context: "observed_invoice".to_string(),
                        },
                    );
                }
            }
        }

        for correction in corrections {
            let confidence = (BASE_FIELD_CONFIDENCE + self.config.vendor_specific_boost).min(1.0);
            confidences.push(confidence);
            self.upsert_mapping(
                memory,
                &correction.field,
                &correction.field,
                confidence,
                MappingExample {
                    source_value: correction
                        .source_value
                        .clone()
                        .unwrap_or_else(|| correction.corrected_value.clone()),
                    target_value: correction.corrected_value.clone(),
                    context: "human_correction".to_string(),
                },
            );
        }

        if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
        }
    }

    fn upsert_mapping(
        &self,
        memory: &mut VendorMemory,
        source_field: &str,
        target_field: &str,
        confidence: f64,
        example: MappingExample,
    ) {
        if let Some(existing) = memory
            .field_mappings
            .iter_mut()
            .find(|m| m.source_field == source_field && m.target_field == target_field)
        {
            existing.confidence = existing.confidence.max(confidence);
            existing.push_example(example);
        } else {
            memory.field_mappings.push(FieldMapping {
                source_field: source_field.to_string(),
                target_field: target_field.to_string(),
                transformation_rule: Self::transformation_rule_for(target_field),
                confidence,
                examples: vec![example],
            });
        }
    }

    /// The transformation rule a normalized target field implies: the
    /// three date targets in [`constants::FIELD_MAPPINGS`]
    /// (`serviceDate`/`invoiceDate`/`dueDate`) parse from the German
    /// `DD.MM.YYYY` convention (spec §8 scenario S4: "transformationRule
    /// type=DATE_PARSING"); every other known target is copied verbatim.
    fn transformation_rule_for(target_field: &str) -> TransformationRule {
        const DATE_TARGETS: &[&str] = &["serviceDate", "invoiceDate", "dueDate"];
        if DATE_TARGETS.contains(&target_field) {
            TransformationRule::date_parsing("DD.MM.YYYY")
        } else {
            TransformationRule::direct_copy()
        }
    }

    fn mine_vat_behavior(
        &self,
        memory: &mut VendorMemory,
        observations: &[RawInvoiceObservation],
    ) -> Option<f64> {
        if observations.is_empty() {
            return None;
        }

        let mut inclusion_count = 0usize;
        let mut exclusion_count = 0usize;
        let mut indicators = Vec::new();
        let mut rates: HashMap<String, usize> = HashMap::new();

        let rate_regex = match Regex::new(constants::VAT_RATE_REGEX) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(error = %e, "failed to compile VAT rate regex");
                None
            }
        };

        for obs in observations {
            let lower = obs.raw_text.to_lowercase();
            for indicator in constants::VAT_INCLUSION_INDICATORS {
                if lower.contains(indicator) {
                    inclusion_count += 1;
                    indicators.push((*indicator).to_string());
                }
            }
            for indicator in constants::VAT_EXCLUSION_INDICATORS {
                if lower.contains(indicator) {
                    exclusion_count += 1;
                    indicators.push((*indicator).to_string());
                }
            }
            if let Some(re) = &rate_regex {
                if let Some(caps) = re.captures(&lower) {
                    if let Some(m) = caps.get(1) {
                        *rates.entry(m.as_str().replace(',', ".")).or_insert(0) += 1;
                    }
                }
            }
        }

        if inclusion_count == 0 && exclusion_count == 0 {
            return None;
        }

        let default_vat_rate = rates
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .and_then(|(rate, _)| rate.parse::<f64>().ok());

        indicators.sort();
        indicators.dedup();

        memory.vat_behavior = VatBehavior {
            vat_included_in_prices: inclusion_count > exclusion_count,
            default_vat_rate,
            vat_inclusion_indicators: indicators,
        };

        let total = (inclusion_count + exclusion_count) as f64;
        let majority = inclusion_count.max(exclusion_count) as f64;
        Some((majority / total).clamp(0.0, 1.0))
    }

    fn mine_currency_patterns(
        &self,
        memory: &mut VendorMemory,
        observations: &[RawInvoiceObservation],
    ) -> Option<f64> {
        let re = Regex::new(constants::EUR_CURRENCY_REGEX).ok()?;
        let match_count = observations
            .iter()
            .filter(|obs| re.is_match(&obs.raw_text))
            .count();

        if match_count < self.config.min_examples_for_pattern {
            return None;
        }

        let confidence = (match_count as f64 / observations.len().max(1) as f64).clamp(0.0, 1.0);
        memory.currency_patterns.push(CurrencyPattern {
            regex: constants::EUR_CURRENCY_REGEX.to_string(),
            currency_code: "EUR".to_string(),
            match_count,
            confidence,
        });
        Some(confidence)
    }

    fn mine_date_formats(
        &self,
        memory: &mut VendorMemory,
        observations: &[RawInvoiceObservation],
    ) -> Option<f64> {
        let mut fired_confidences = Vec::new();

        for (format_name, pattern) in constants::DATE_FORMAT_PATTERNS {
            let Ok(re) = Regex::new(pattern) else {
                continue;
            };
            let match_count = observations
                .iter()
                .filter(|obs| re.is_match(&obs.raw_text))
                .count();
            if match_count < self.config.min_examples_for_pattern {
                continue;
            }
            let confidence =
                (match_count as f64 / observations.len().max(1) as f64).clamp(0.0, 1.0);
            fired_confidences.push(confidence);
            memory.date_formats.push(DateFormatPattern {
                regex: (*pattern).to_string(),
                format_name: (*format_name).to_string(),
                match_count,
                confidence,
            });
        }

        if fired_confidences.is_empty() {
            None
        } else {
            Some(fired_confidences.iter().sum::<f64>() / fired_confidences.len() as f64)
        }
    }

    /// Merge `new` into `existing` (spec §4.4 "Merging rule"). For each
    /// list, a new entry replaces an existing one only if strictly more
    /// confident; VAT inclusion is overwritten by the new majority;
    /// indicator sets are unioned.
    pub fn merge(&self, existing: &mut VendorMemory, new: VendorMemory) {
        for new_mapping in new.field_mappings {
            match existing
                .field_mappings
                .iter_mut()
                .find(|m| m.source_field == new_mapping.source_field)
            {
                Some(slot) if new_mapping.confidence > slot.confidence => *slot = new_mapping,
                Some(_) => {}
                None => existing.field_mappings.push(new_mapping),
            }
        }

        for new_currency in new.currency_patterns {
            match existing
                .currency_patterns
                .iter_mut()
                .find(|c| c.currency_code == new_currency.currency_code)
            {
                Some(slot) if new_currency.confidence > slot.confidence => *slot = new_currency,
                Some(_) => {}
                None => existing.currency_patterns.push(new_currency),
            }
        }

        for new_date in new.date_formats {
            match existing
                .date_formats
                .iter_mut()
                .find(|d| d.format_name == new_date.format_name)
            {
                Some(slot) if new_date.confidence > slot.confidence => *slot = new_date,
                Some(_) => {}
                None => existing.date_formats.push(new_date),
            }
        }

        if new.vat_behavior.default_vat_rate.is_some()
            || !new.vat_behavior.vat_inclusion_indicators.is_empty()
        {
            existing.vat_behavior.vat_included_in_prices = new.vat_behavior.vat_included_in_prices;
            if new.vat_behavior.default_vat_rate.is_some() {
                existing.vat_behavior.default_vat_rate = new.vat_behavior.default_vat_rate;
            }
            let mut indicators = existing.vat_behavior.vat_inclusion_indicators.clone();
            indicators.extend(new.vat_behavior.vat_inclusion_indicators);
            indicators.sort();
            indicators.dedup();
            existing.vat_behavior.vat_inclusion_indicators = indicators;
        }
    }

    /// The confidence a `VendorMemory`'s owning envelope should move to
    /// after merging in a re-analysis of fused confidence `overall`
    /// (spec §4.4: "merging ... raises its confidence by `0.15·overall`").
    #[must_use]
    pub fn merged_confidence(existing_confidence: f64, overall: f64) -> f64 {
        crate::types::clamp_confidence(existing_confidence + 0.15 * overall)
    }
}
