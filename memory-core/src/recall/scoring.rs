//! Variant-specific relevance, recency, and context-match scoring
//! (spec §4.3).

use chrono::{DateTime, Utc};

use crate::types::{InvoiceContext, Memory, MemoryPayload};

use super::types::ContextMatch;

/// Half-life used by [`recency_score`]. Two weeks: a memory applied
/// yesterday is nearly as relevant as one applied today, but one unused
/// for months should fade toward (not below) zero.
const RECENCY_HALF_LIFE_MS: f64 = 14.0 * 24.0 * 60.0 * 60.0 * 1000.0;

/// Score how recently a memory was used, `1.0` at zero elapsed time,
/// monotone non-increasing, never negative.
#[must_use]
pub fn recency_score(last_used: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed_ms = (now - last_used).num_milliseconds().max(0) as f64;
    0.5_f64.powf(elapsed_ms / RECENCY_HALF_LIFE_MS).clamp(0.0, 1.0)
}

/// Build the [`ContextMatch`] breakdown for one candidate against a query
/// context.
#[must_use]
pub fn context_match(memory: &Memory, ctx: &InvoiceContext) -> ContextMatch {
    let vendor_match = memory.envelope.context.vendor_id.as_deref() == Some(ctx.vendor_info.id.as_str());
    let language_match = memory.envelope.context.invoice_characteristics.language == ctx.language;
    let complexity_match =
        memory.envelope.context.invoice_characteristics.complexity == ctx.complexity;
    let quality_diff = (memory.envelope.context.invoice_characteristics.extraction_quality
        - ctx.extraction_quality)
        .abs();
    let quality_match = quality_diff <= 0.1;

    let similarity_score = ([vendor_match, language_match, complexity_match, quality_match]
        .into_iter()
        .filter(|m| *m)
        .count() as f64)
        / 4.0;

    ContextMatch {
        vendor_match,
        language_match,
        complexity_match,
        quality_match,
        similarity_score,
    }
}

fn language_bonus(matched: bool) -> f64 {
    if matched { 1.1 } else { 1.0 }
}

fn complexity_bonus(matched: bool, factor: f64) -> f64 {
    if matched { factor } else { 1.0 }
}

fn vendor_bonus(matched: bool, factor: f64) -> f64 {
    if matched { factor } else { 1.0 }
}

/// Variant-specific relevance score (spec §4.3 "Relevance per variant").
///
/// Returns `0.0` for a `VendorMemory` whose `payload.vendor_id` does not
/// equal `ctx.vendor_info.id`, and for a `CorrectionMemory` with no
/// trigger conditions.
#[must_use]
pub fn relevance_score(memory: &Memory, ctx: &InvoiceContext, cm: &ContextMatch) -> f64 {
    let confidence = memory.envelope.confidence;
    let success_rate = memory.envelope.success_rate;

    let raw = match &memory.payload {
        MemoryPayload::Vendor(v) => {
            if v.vendor_id != ctx.vendor_info.id {
                return 0.0;
            }
            confidence
                * (0.5 + 0.5 * success_rate)
                * language_bonus(cm.language_match)
                * complexity_bonus(cm.complexity_match, 1.05)
        }
        MemoryPayload::Correction(c) => {
            if c.trigger_conditions.is_empty() {
                return 0.0;
            }
            confidence
                * (0.3 + 0.7 * success_rate)
                * vendor_bonus(cm.vendor_match, 1.2)
                * complexity_bonus(cm.complexity_match, 1.1)
        }
        MemoryPayload::Resolution(r) => {
            let factor_sum: f64 = r.context_factors.iter().map(|f| f.weight * 0.1).sum();
            confidence
                * (0.5 + 0.5 * r.human_decision.confidence)
                * vendor_bonus(cm.vendor_match, 1.3)
                * (1.0 + factor_sum.min(0.5))
        }
    };

    raw.clamp(0.0, 1.0)
}
