//! # Test Utilities
//!
//! Shared fixtures and builders for exercising the invoice memory
//! subsystem, used by `invoice-memory-core`'s and
//! `invoice-memory-storage-redb`'s integration tests.
//!
//! Provides:
//! - Fixture builders for vendor/correction/resolution memories
//! - A ready-made [`InvoiceContext`] builder
//! - A scratch [`RedbStorage`] opened in a temp directory

use chrono::{DateTime, Utc};
use uuid::Uuid;

use invoice_memory_core::error::Result;
use invoice_memory_core::types::{
    ComplexityLevel, CorrectionAction, CorrectionMemory, CorrectionType, Environment, HistoryEntry,
    InvoiceContext, InvoiceRef, Memory, MemoryContext, Pattern, Priority, RelationshipType,
    ResolutionMemory, VendorInfo,
};
use invoice_memory_storage_redb::RedbStorage;

/// A vendor memory for `vendor_id`, with a single direct-copy field
/// mapping pattern and the given confidence.
#[must_use]
pub fn test_vendor_memory(vendor_id: &str, confidence: f64) -> Memory {
    Memory::new_vendor(
        vendor_id,
        MemoryContext::default(),
        Pattern::new("field_mapping", 0.5),
        confidence,
        Utc::now(),
    )
    .expect("vendor_id is non-empty")
}

/// A correction memory that sets `target_field` to `new_value` whenever
/// the trigger field is present.
#[must_use]
pub fn test_correction_memory(target_field: &str, new_value: &str, confidence: f64) -> Memory {
    let payload = CorrectionMemory {
        correction_type: CorrectionType::for_field(target_field),
        trigger_conditions: vec![],
        correction_action: CorrectionAction {
            action_type: "SET_FIELD".to_string(),
            target_field: target_field.to_string(),
            new_value: new_value.to_string(),
            explanation: "test fixture".to_string(),
        },
        validation_rules: vec![],
    };
    Memory::new_correction(
        payload,
        MemoryContext::default(),
        Pattern::new("correction", 0.5),
        confidence,
        Utc::now(),
    )
}

/// A resolution memory for the given discrepancy/outcome pair.
#[must_use]
pub fn test_resolution_memory(discrepancy_type: &str, outcome: &str, confidence: f64) -> Memory {
    let payload = ResolutionMemory {
        discrepancy_type: discrepancy_type.to_string(),
        resolution_outcome: outcome.to_string(),
        human_decision: invoice_memory_core::types::HumanDecision {
            decision: outcome.to_string(),
            confidence,
            rationale: None,
        },
        context_factors: vec![],
    };
    Memory::new_resolution(
        payload,
        MemoryContext::default(),
        Pattern::new("resolution", 0.5),
        confidence,
        Utc::now(),
    )
}

/// An [`InvoiceRef`] with a parseable `"YYYY-MM-DD"` date and no amount.
#[must_use]
pub fn test_invoice_ref(vendor_id: &str, invoice_number: &str, date: &str) -> InvoiceRef {
    InvoiceRef {
        vendor_id: vendor_id.to_string(),
        invoice_number: invoice_number.to_string(),
        invoice_date: date.parse().ok(),
        amount: None,
    }
}

/// A fully-populated [`InvoiceContext`] for `vendor_id`, suitable for
/// feeding directly to [`invoice_memory_core::recall::RecallEngine::recall`].
#[must_use]
pub fn test_invoice_context(vendor_id: &str, invoice_number: &str, now: DateTime<Utc>) -> InvoiceContext {
    InvoiceContext {
        invoice: test_invoice_ref(vendor_id, invoice_number, &now.format("%Y-%m-%d").to_string()),
        vendor_info: VendorInfo {
            id: vendor_id.to_string(),
            name: format!("{vendor_id} GmbH"),
            language: "de".to_string(),
            relationship_type: RelationshipType::Regular,
        },
        environment: Environment {
            timestamp: now,
            priority: Priority::Normal,
            time_constraints: None,
            regulatory_context: None,
        },
        history: Vec::<HistoryEntry>::new(),
        language: "de".to_string(),
        complexity: ComplexityLevel::Moderate,
        extraction_quality: 0.95,
    }
}

/// Open a [`RedbStorage`] inside a fresh `tempfile::TempDir`, returning
/// both so the directory isn't dropped (and the file deleted) out from
/// under the caller.
pub async fn temp_redb_storage() -> Result<(tempfile::TempDir, RedbStorage)> {
    let dir = tempfile::tempdir().map_err(|e| {
        invoice_memory_core::error::Error::Storage(format!("failed to create temp dir: {e}"))
    })?;
    let storage = RedbStorage::open(&dir.path().join("test.redb")).await?;
    Ok((dir, storage))
}

/// A random vendor id, useful when a test only needs vendor isolation
/// and doesn't care about the specific value.
#[must_use]
pub fn random_vendor_id() -> String {
    format!("vendor-{}", Uuid::new_v4())
}
