//! # Learning Engine
//!
//! Turns human corrections and applied-memory outcomes into new or
//! reinforced memories (spec §4.5).

pub mod config;
mod patterns;
mod types;

pub use config::LearningConfig;
pub use patterns::MinedPattern;
pub use types::{
    HumanCorrection, LearningOutcome, LearningResult, LearningStrategy, ProcessingResolution,
    ValueKind,
};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::audit::{AuditLog, AuditOperation};
use crate::confidence;
use crate::error::Result;
use crate::storage::StorageBackend;
use crate::types::{
    CorrectionAction, CorrectionMemory, CorrectionType, Memory, MemoryContext, MemoryType,
    Outcome, Pattern, ResolutionMemory, SatisfactionRating, TriggerCondition,
};

/// Turns corrections and outcomes into memories, bounded by
/// [`LearningConfig::max_memories_per_session`].
pub struct LearningEngine {
    storage: Arc<dyn StorageBackend>,
    config: LearningConfig,
    audit: AuditLog,
}

impl LearningEngine {
    /// Construct a learning engine over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, config: LearningConfig) -> Self {
        Self {
            storage,
            config,
            audit: AuditLog::new(),
        }
    }

    /// The audit trail of every call made through this engine.
    #[must_use]
    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// Learn from a batch of human corrections (spec §4.5 input (a)).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Storage`] if persisting a mined
    /// memory fails.
    #[instrument(skip(self, corrections, context))]
    pub async fn learn_from_corrections(
        &self,
        vendor_id: Option<&str>,
        corrections: &[HumanCorrection],
        context: MemoryContext,
        strategy: LearningStrategy,
        now: DateTime<Utc>,
    ) -> Result<LearningOutcome> {
        let started = std::time::Instant::now();
        let session_id = Uuid::new_v4();

        if !self.config.enable_correction_pattern_learning {
            return Ok(self.empty_outcome(session_id, strategy, corrections.len(), now));
        }

        // Build the candidate emissions first, without persisting anything,
        // so the `maxMemoriesPerSession` bound (spec §4.5 "Bounds") caps
        // what actually gets written to storage — not merely what gets
        // reported in `learning_results` after the fact.
        let (mut candidates, patterns_recognized) = match strategy {
            LearningStrategy::Immediate => (self.plan_immediate(corrections), 0),
            LearningStrategy::Batch => (self.plan_batched(corrections), 0),
            LearningStrategy::PatternBased => self.plan_pattern_based(corrections),
        };
        candidates.truncate(self.config.max_memories_per_session);

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            results.push(
                self.persist_correction_memory(
                    &candidate.correction,
                    &candidate.source_indices,
                    candidate.pattern_tag,
                    candidate.confidence_override,
                    &context,
                    now,
                )
                .await?,
            );
        }

        let memories_created = results.iter().filter(|r| r.success).count();
        let successful_confidences: Vec<f64> = results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.confidence)
            .collect();
        let learning_confidence = if successful_confidences.is_empty() {
            0.0
        } else {
            successful_confidences.iter().sum::<f64>() / successful_confidences.len() as f64
        };

        let reasoning = format!(
            "processed {} corrections via {strategy:?}; created {memories_created} memories from {patterns_recognized} patterns; success rate {:.0}%",
            corrections.len(),
            if results.is_empty() {
                0.0
            } else {
                100.0 * memories_created as f64 / results.len() as f64
            }
        );

        self.audit.push(
            AuditOperation::MemoryLearning,
            "LearningEngine",
            "learned from corrections",
            format!("vendor_id={vendor_id:?} corrections={}", corrections.len()),
            format!("memories_created={memories_created}"),
            started.elapsed().as_millis() as u64,
            now,
        );

        info!(memories_created, patterns_recognized, "learning session complete");

        Ok(LearningOutcome {
            session_id,
            timestamp: now,
            strategy,
            corrections_processed: corrections.len(),
            memories_created,
            memories_reinforced: 0,
            patterns_recognized,
            learning_confidence,
            learning_results: results,
            reasoning,
        })
    }

    /// Reinforce each approved applied memory (spec §4.5 "Reinforcement
    /// on approval").
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Storage`] on a storage failure.
    pub async fn reinforce_approved(
        &self,
        approved: &[(Uuid, Outcome, Option<SatisfactionRating>)],
        now: DateTime<Utc>,
    ) -> Result<LearningOutcome> {
        let started = std::time::Instant::now();
        let session_id = Uuid::new_v4();
        let mut results = Vec::new();
        let mut reinforced = 0;

        for (id, outcome, rating) in approved {
            let Some(memory) = self.storage.find_by_id(*id).await? else {
                results.push(LearningResult {
                    memory_type: MemoryType::Correction,
                    memory_id: Some(*id),
                    confidence: 0.0,
                    source_corrections: vec![],
                    pattern: None,
                    success: false,
                    error_message: Some("memory not found".to_string()),
                });
                continue;
            };

            let new_confidence = confidence::reinforce(memory.envelope.confidence, *outcome, *rating);
            let updated = memory
                .with_confidence(new_confidence)
                .with_usage_update(outcome.is_success(), now);
            let memory_type = updated.envelope.memory_type;
            self.storage.save(updated).await?;
            reinforced += 1;

            results.push(LearningResult {
                memory_type,
                memory_id: Some(*id),
                confidence: new_confidence,
                source_corrections: vec![],
                pattern: None,
                success: true,
                error_message: None,
            });
        }

        let learning_confidence = if results.is_empty() {
            0.0
        } else {
            results.iter().filter(|r| r.success).map(|r| r.confidence).sum::<f64>()
                / results.len().max(1) as f64
        };

        let reasoning = format!(
            "reinforced {reinforced} of {} approved memories",
            approved.len()
        );

        self.audit.push(
            AuditOperation::MemoryLearning,
            "LearningEngine",
            "reinforced approved memories",
            format!("count={}", approved.len()),
            format!("reinforced={reinforced}"),
            started.elapsed().as_millis() as u64,
            now,
        );

        Ok(LearningOutcome {
            session_id,
            timestamp: now,
            strategy: LearningStrategy::Immediate,
            corrections_processed: 0,
            memories_created: 0,
            memories_reinforced: reinforced,
            patterns_recognized: 0,
            learning_confidence,
            learning_results: results,
            reasoning,
        })
    }

    /// Learn a [`ResolutionMemory`] from a full processing outcome with
    /// human feedback (spec §4.5 input (b)), gated by
    /// [`LearningConfig::enable_resolution_learning`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Storage`] if persisting the memory
    /// fails.
    #[instrument(skip(self, resolution, context))]
    pub async fn learn_from_resolution(
        &self,
        resolution: ProcessingResolution,
        context: MemoryContext,
        now: DateTime<Utc>,
    ) -> Result<LearningOutcome> {
        let started = std::time::Instant::now();
        let session_id = Uuid::new_v4();

        if !self.config.enable_resolution_learning {
            return Ok(self.resolution_learning_disabled_outcome(session_id, now));
        }

        let discrepancy_type = resolution.discrepancy_type;
        let confidence = self
            .config
            .min_new_memory_confidence
            .max(resolution.human_decision.confidence);

        let payload = ResolutionMemory {
            discrepancy_type: discrepancy_type.clone(),
            resolution_outcome: resolution.resolution_outcome,
            human_decision: resolution.human_decision,
            context_factors: resolution.context_factors,
        };
        let memory = Memory::new_resolution(
            payload,
            context,
            Pattern::new(discrepancy_type.clone(), confidence),
            confidence,
            now,
        );
        let memory_id = memory.envelope.id;
        self.storage.save(memory).await?;

        let result = LearningResult {
            memory_type: MemoryType::Resolution,
            memory_id: Some(memory_id),
            confidence,
            source_corrections: vec![],
            pattern: Some(discrepancy_type.clone()),
            success: true,
            error_message: None,
        };

        let reasoning = format!(
            "learned a resolution memory for discrepancy type {discrepancy_type}; success rate 100%"
        );

        self.audit.push(
            AuditOperation::MemoryLearning,
            "LearningEngine",
            "learned from processing resolution",
            format!("discrepancy_type={discrepancy_type}"),
            "memories_created=1",
            started.elapsed().as_millis() as u64,
            now,
        );

        info!(discrepancy_type = %discrepancy_type, "resolution learning complete");

        Ok(LearningOutcome {
            session_id,
            timestamp: now,
            strategy: LearningStrategy::Immediate,
            corrections_processed: 0,
            memories_created: 1,
            memories_reinforced: 0,
            patterns_recognized: 0,
            learning_confidence: confidence,
            learning_results: vec![result],
            reasoning,
        })
    }

    fn resolution_learning_disabled_outcome(&self, session_id: Uuid, now: DateTime<Utc>) -> LearningOutcome {
        LearningOutcome {
            session_id,
            timestamp: now,
            strategy: LearningStrategy::Immediate,
            corrections_processed: 0,
            memories_created: 0,
            memories_reinforced: 0,
            patterns_recognized: 0,
            learning_confidence: 0.0,
            learning_results: vec![],
            reasoning: "resolution learning is disabled".to_string(),
        }
    }

    fn empty_outcome(
        &self,
        session_id: Uuid,
        strategy: LearningStrategy,
        corrections_processed: usize,
        now: DateTime<Utc>,
    ) -> LearningOutcome {
        LearningOutcome {
            session_id,
            timestamp: now,
            strategy,
            corrections_processed,
            memories_created: 0,
            memories_reinforced: 0,
            patterns_recognized: 0,
            learning_confidence: 0.0,
            learning_results: vec![],
            reasoning: "correction pattern learning is disabled".to_string(),
        }
    }

    fn plan_immediate(&self, corrections: &[HumanCorrection]) -> Vec<PlannedEmission> {
        corrections
            .iter()
            .enumerate()
            .map(|(i, correction)| PlannedEmission {
                correction: correction.clone(),
                source_indices: vec![i],
                pattern_tag: None,
                confidence_override: None,
            })
            .collect()
    }

    fn plan_batched(&self, corrections: &[HumanCorrection]) -> Vec<PlannedEmission> {
        let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();
        for (i, correction) in corrections.iter().enumerate() {
            groups
                .entry((correction.field.clone(), correction.corrected_value.clone()))
                .or_default()
                .push(i);
        }

        groups
            .into_iter()
            .filter(|(_, indices)| indices.len() >= 2)
            .map(|(_, indices)| PlannedEmission {
                correction: corrections[indices[0]].clone(),
                source_indices: indices,
                pattern_tag: None,
                confidence_override: None,
            })
            .collect()
    }

    fn plan_pattern_based(&self, corrections: &[HumanCorrection]) -> (Vec<PlannedEmission>, usize) {
        let mined = patterns::mine(corrections, &self.config);
        let mut covered = vec![false; corrections.len()];
        let mut planned = Vec::with_capacity(mined.len());

        for pattern in &mined {
            for &i in &pattern.source_indices {
                covered[i] = true;
            }
            planned.push(PlannedEmission {
                correction: HumanCorrection {
                    field: pattern.field.clone(),
                    original_value: None,
                    corrected_value: pattern.most_common_value.clone(),
                },
                source_indices: pattern.source_indices.clone(),
                pattern_tag: Some(pattern.field.clone()),
                confidence_override: Some(pattern.confidence),
            });
        }

        for (i, correction) in corrections.iter().enumerate() {
            if covered[i] {
                continue;
            }
            planned.push(PlannedEmission {
                correction: correction.clone(),
                source_indices: vec![i],
                pattern_tag: None,
                confidence_override: None,
            });
        }

        let patterns_recognized = mined.len();
        (planned, patterns_recognized)
    }

    async fn persist_correction_memory(
        &self,
        correction: &HumanCorrection,
        source_indices: &[usize],
        pattern_tag: Option<String>,
        confidence_override: Option<f64>,
        context: &MemoryContext,
        now: DateTime<Utc>,
    ) -> Result<LearningResult> {
        let correction_type = CorrectionType::for_field(&correction.field);
        let payload = CorrectionMemory {
            correction_type,
            trigger_conditions: vec![TriggerCondition::FieldExists {
                field: correction.field.clone(),
            }],
            correction_action: CorrectionAction {
                action_type: "SET_FIELD".to_string(),
                target_field: correction.field.clone(),
                new_value: correction.corrected_value.clone(),
                explanation: format!("learned from {} correction(s)", source_indices.len()),
            },
            validation_rules: vec![],
        };

        let confidence =
            confidence_override.unwrap_or_else(|| self.config.min_new_memory_confidence.max(0.5));
        let memory = Memory::new_correction(
            payload,
            context.clone(),
            Pattern::new(
                pattern_tag
                    .clone()
                    .unwrap_or_else(|| "correction".to_string()),
                confidence,
            ),
            confidence,
            now,
        );

        let memory_id = memory.envelope.id;
        self.storage.save(memory).await?;

        Ok(LearningResult {
            memory_type: MemoryType::Correction,
            memory_id: Some(memory_id),
            confidence,
            source_corrections: source_indices.to_vec(),
            pattern: pattern_tag,
            success: true,
            error_message: None,
        })
    }
}

/// One correction memory planned for emission, before it is persisted —
/// lets `learn_from_corrections` apply `maxMemoriesPerSession` (spec §4.5
/// "Bounds") against what will actually be written, not against an
/// already-written batch.
struct PlannedEmission {
    correction: HumanCorrection,
    source_indices: Vec<usize>,
    pattern_tag: Option<String>,
    confidence_override: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;

    fn correction(field: &str, value: &str) -> HumanCorrection {
        HumanCorrection {
            field: field.to_string(),
            original_value: None,
            corrected_value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn immediate_strategy_emits_one_memory_per_correction() {
        let storage = Arc::new(InMemoryStorage::new());
        let engine = LearningEngine::new(storage.clone(), LearningConfig::default());
        let corrections = vec![correction("totalAmount", "100"), correction("quantity", "2")];

        let outcome = engine
            .learn_from_corrections(
                Some("vendor-1"),
                &corrections,
                MemoryContext::default(),
                LearningStrategy::Immediate,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.memories_created, 2);
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn batch_strategy_groups_equal_corrections() {
        let storage = Arc::new(InMemoryStorage::new());
        let engine = LearningEngine::new(storage.clone(), LearningConfig::default());
        let corrections = vec![
            correction("purchaseOrderNumber", "PO-1"),
            correction("purchaseOrderNumber", "PO-1"),
            correction("quantity", "5"),
        ];

        let outcome = engine
            .learn_from_corrections(
                Some("vendor-1"),
                &corrections,
                MemoryContext::default(),
                LearningStrategy::Batch,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.memories_created, 1);
    }

    #[tokio::test]
    async fn pattern_based_strategy_falls_back_to_immediate_for_uncovered() {
        let storage = Arc::new(InMemoryStorage::new());
        let engine = LearningEngine::new(storage.clone(), LearningConfig::default());
        let corrections = vec![
            correction("serviceDate", "2024-01-01"),
            correction("serviceDate", "2024-01-02"),
            correction("serviceDate", "2024-01-03"),
            correction("currency", "EUR"),
        ];

        let outcome = engine
            .learn_from_corrections(
                Some("vendor-1"),
                &corrections,
                MemoryContext::default(),
                LearningStrategy::PatternBased,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.patterns_recognized, 1);
        assert_eq!(outcome.memories_created, 2);
    }

    #[tokio::test]
    async fn session_is_bounded_by_max_memories_per_session() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut config = LearningConfig::default();
        config.max_memories_per_session = 1;
        let engine = LearningEngine::new(storage.clone(), config);
        let corrections = vec![correction("totalAmount", "100"), correction("quantity", "2")];

        let outcome = engine
            .learn_from_corrections(
                Some("vendor-1"),
                &corrections,
                MemoryContext::default(),
                LearningStrategy::Immediate,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.learning_results.len(), 1);
        // the bound applies to what is actually persisted, not just to
        // what is reported.
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    fn resolution(decision_confidence: f64) -> ProcessingResolution {
        ProcessingResolution {
            discrepancy_type: "vat_mismatch".to_string(),
            resolution_outcome: "accepted_vendor_amount".to_string(),
            human_decision: crate::types::HumanDecision {
                decision: "accept_vendor_amount".to_string(),
                confidence: decision_confidence,
                rationale: Some("matches prior invoices".to_string()),
            },
            context_factors: vec![crate::types::ContextFactor {
                factor: "vendor_history".to_string(),
                weight: 0.5,
            }],
        }
    }

    #[tokio::test]
    async fn learn_from_resolution_persists_a_resolution_memory() {
        let storage = Arc::new(InMemoryStorage::new());
        let engine = LearningEngine::new(storage.clone(), LearningConfig::default());

        let outcome = engine
            .learn_from_resolution(resolution(0.9), MemoryContext::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.memories_created, 1);
        assert_eq!(outcome.learning_results.len(), 1);
        assert_eq!(outcome.learning_results[0].memory_type, MemoryType::Resolution);
        assert_eq!(storage.count().await.unwrap(), 1);

        let memory_id = outcome.learning_results[0].memory_id.expect("memory id");
        let stored = storage.find_by_id(memory_id).await.unwrap().expect("stored");
        assert!(matches!(stored.payload, crate::types::MemoryPayload::Resolution(_)));
    }

    #[tokio::test]
    async fn learn_from_resolution_is_a_noop_when_disabled() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut config = LearningConfig::default();
        config.enable_resolution_learning = false;
        let engine = LearningEngine::new(storage.clone(), config);

        let outcome = engine
            .learn_from_resolution(resolution(0.9), MemoryContext::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.memories_created, 0);
        assert!(outcome.learning_results.is_empty());
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reinforce_approved_updates_confidence_and_usage() {
        let storage = Arc::new(InMemoryStorage::new());
        let engine = LearningEngine::new(storage.clone(), LearningConfig::default());

        let memory = Memory::new_vendor(
            "vendor-1",
            MemoryContext::default(),
            Pattern::new("field_mapping", 0.5),
            0.5,
            Utc::now(),
        )
        .unwrap();
        let id = memory.envelope.id;
        storage.save(memory).await.unwrap();

        let outcome = engine
            .reinforce_approved(&[(id, Outcome::SuccessAuto, None)], Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.memories_reinforced, 1);
        let updated = storage.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(updated.envelope.usage_count, 1);
    }
}
