//! Append-only audit trail emitted by every public engine call (spec §6).
//!
//! Grounded in the teacher's `security/audit/types.rs` tagged-enum +
//! structured-field convention, narrowed to the four operation kinds the
//! specification names.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// The kind of operation an [`AuditRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    /// A learning-engine call that created or reinforced memories.
    MemoryLearning,
    /// A recall-engine call that ranked and returned memories.
    MemoryRecall,
    /// An input- or invariant-validation step.
    Validation,
    /// A caught, non-propagated failure (e.g. storage unavailable).
    ErrorHandling,
}

/// One entry in an engine's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique id for this record.
    pub id: Uuid,
    /// When the operation completed.
    pub timestamp: DateTime<Utc>,
    /// What kind of operation this was.
    pub operation: AuditOperation,
    /// A short, human-readable description.
    pub description: String,
    /// A small structured summary of the input.
    pub input: String,
    /// A small structured summary of the output.
    pub output: String,
    /// Which engine emitted this record, e.g. `"RecallEngine"`.
    pub actor: String,
    /// Wall-clock duration of the operation, in milliseconds.
    pub duration_ms: u64,
}

/// An append-only, per-engine audit log.
///
/// Clearable for tests (spec §5: "the `auditSteps` ring ... clearable by
/// tests").
#[derive(Clone, Default)]
pub struct AuditLog {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl AuditLog {
    /// Construct an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn record(&self, record: AuditRecord) {
        self.records.write().push(record);
    }

    /// Build and append a record from its constituent fields.
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &self,
        operation: AuditOperation,
        actor: impl Into<String>,
        description: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        duration_ms: u64,
        now: DateTime<Utc>,
    ) {
        self.record(AuditRecord {
            id: Uuid::new_v4(),
            timestamp: now,
            operation,
            description: description.into(),
            input: input.into(),
            output: output.into(),
            actor: actor.into(),
            duration_ms,
        });
    }

    /// Retrieve all records, in append order.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    /// Clear all records.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
