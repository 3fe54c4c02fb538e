//! # Recall Engine
//!
//! Given an [`InvoiceContext`], returns a ranked list of memories likely
//! to be useful for processing that invoice (spec §4.3).
//!
//! Candidate gathering and scoring never read the wall clock directly —
//! a single `now` is sampled once per call through the injected [`Clock`],
//! so identical inputs produce byte-identical outputs.

mod clock;
mod config;
mod scoring;
mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RecallConfig;
pub use types::{ContextMatch, ContextMatchStats, RankedMemory, RecallResult};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::audit::{AuditLog, AuditOperation};
use crate::storage::StorageBackend;
use crate::types::InvoiceContext;

/// Number of non-vendor-scoped candidates pulled from [`StorageBackend::all`]
/// to seed cross-vendor generic-pattern matches (spec §4.3 step 1).
const CROSS_VENDOR_CANDIDATE_CAP: usize = 200;

/// Ranks stored memories against an invoice context.
pub struct RecallEngine {
    storage: Arc<dyn StorageBackend>,
    config: RecallConfig,
    clock: Arc<dyn Clock>,
    audit: AuditLog,
}

impl RecallEngine {
    /// Construct a recall engine over `storage`, with the given
    /// configuration and clock collaborator.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, config: RecallConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            config,
            clock,
            audit: AuditLog::new(),
        }
    }

    /// The audit trail of every `recall` call made through this engine.
    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Rank stored memories against `ctx` (spec §4.3 algorithm, steps 1–5).
    ///
    /// Never returns an error: a storage failure degrades to an empty
    /// result with a reasoning string naming the failure, mirroring
    /// [`crate::duplicate::DuplicateDetector::check`] (spec §7
    /// "Recall and DuplicateDetector catch `StorageUnavailable`, return
    /// an empty ... result ... and log one audit step of
    /// operation=ErrorHandling").
    #[instrument(skip(self, ctx), fields(vendor_id = %ctx.vendor_info.id))]
    pub async fn recall(&self, ctx: &InvoiceContext) -> RecallResult {
        let started = std::time::Instant::now();
        let now = self.clock.now();

        let mut candidates = match self.storage.find_by_vendor(&ctx.vendor_info.id).await {
            Ok(c) => c,
            Err(e) => return self.degraded_result(&e, ctx, started, now),
        };
        if self.config.enable_vendor_prioritization {
            let generic = match self.storage.all().await {
                Ok(g) => g,
                Err(e) => return self.degraded_result(&e, ctx, started, now),
            };
            let seen: std::collections::HashSet<_> =
                candidates.iter().map(|m| m.envelope.id).collect();
            candidates.extend(
                generic
                    .into_iter()
                    .filter(|m| !seen.contains(&m.envelope.id))
                    .take(CROSS_VENDOR_CANDIDATE_CAP),
            );
        }

        debug!(candidate_count = candidates.len(), "gathered recall candidates");

        let mut ranked: Vec<RankedMemory> = candidates
            .into_iter()
            .filter_map(|memory| self.score_candidate(&memory, ctx, now))
            .collect();

        ranked.sort_by(|a, b| {
            b.ranking_score
                .partial_cmp(&a.ranking_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(self.config.max_memories_per_query);

        let stats = self.context_match_stats(&ranked);
        let reasoning = self.reasoning(&ranked, &stats);

        self.audit.push(
            AuditOperation::MemoryRecall,
            "RecallEngine",
            "ranked memories for invoice context",
            format!("vendor_id={}", ctx.vendor_info.id),
            format!("{} memories returned", ranked.len()),
            started.elapsed().as_millis() as u64,
            now,
        );

        RecallResult {
            memories: ranked,
            context_match_stats: stats,
            reasoning,
        }
    }

    /// Build the degraded result returned when a storage call fails,
    /// logging one `ErrorHandling` audit step (spec §7).
    fn degraded_result(
        &self,
        error: &crate::error::Error,
        ctx: &InvoiceContext,
        started: std::time::Instant,
        now: chrono::DateTime<chrono::Utc>,
    ) -> RecallResult {
        warn!(error = %error, "recall storage lookup failed");
        self.audit.push(
            AuditOperation::ErrorHandling,
            "RecallEngine",
            "storage lookup failed",
            format!("vendor_id={}", ctx.vendor_info.id),
            "degraded empty result returned",
            started.elapsed().as_millis() as u64,
            now,
        );
        RecallResult {
            memories: vec![],
            context_match_stats: ContextMatchStats::default(),
            reasoning: format!("recall degraded: {error}"),
        }
    }

    fn score_candidate(
        &self,
        memory: &crate::types::Memory,
        ctx: &InvoiceContext,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Option<RankedMemory> {
        let context_match = scoring::context_match(memory, ctx);

        if self.config.enable_pattern_filtering
            && context_match.similarity_score < memory.envelope.pattern.threshold
        {
            return None;
        }

        let relevance_score = scoring::relevance_score(memory, ctx, &context_match);

        if relevance_score < self.config.min_relevance_threshold {
            return None;
        }

        let confidence_score = memory.envelope.confidence;
        let recency_score = scoring::recency_score(memory.envelope.last_used, now);

        let ranking_score = (self.config.confidence_weight * confidence_score
            + self.config.relevance_weight * relevance_score
            + self.config.recency_weight * recency_score)
            .clamp(0.0, 1.0);

        let selection_reason = format!(
            "relevance={relevance_score:.2} confidence={confidence_score:.2} recency={recency_score:.2} vendor_match={}",
            context_match.vendor_match
        );

        Some(RankedMemory {
            memory: memory.clone(),
            ranking_score,
            relevance_score,
            confidence_score,
            recency_score,
            context_match,
            selection_reason,
        })
    }

    fn context_match_stats(&self, ranked: &[RankedMemory]) -> ContextMatchStats {
        let mut memory_type_distribution = HashMap::new();
        let mut exact_vendor_matches = 0;
        let mut language_matches = 0;

        for r in ranked {
            *memory_type_distribution
                .entry(r.memory.envelope.memory_type)
                .or_insert(0) += 1;
            if r.context_match.vendor_match {
                exact_vendor_matches += 1;
            }
            if r.context_match.language_match {
                language_matches += 1;
            }
        }

        ContextMatchStats {
            exact_vendor_matches,
            language_matches,
            memory_type_distribution,
        }
    }

    fn reasoning(&self, ranked: &[RankedMemory], stats: &ContextMatchStats) -> String {
        format!(
            "recalled {} memories; {} exact vendor matches, {} language matches",
            ranked.len(),
            stats.exact_vendor_matches,
            stats.language_matches
        )
    }
}
