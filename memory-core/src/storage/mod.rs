//! # Storage Abstraction
//!
//! Unified trait for storage backends over memories, keyed by id,
//! vendor, type, and pattern (spec §4.1).
//!
//! This lets the engines work with any backing store — an in-process
//! map for tests, or a durable embedded database — transparently.

mod in_memory;

pub use in_memory::InMemoryStorage;

use crate::error::Result;
use crate::types::{Memory, MemoryType, Pattern};
use async_trait::async_trait;
use uuid::Uuid;

/// Unified storage backend trait (spec §4.1, §6).
///
/// All finders exclude archived memories. `save` is an upsert. Writes of
/// a memory's envelope and variant payload happen atomically — a reader
/// must never observe one without the other.
///
/// # Errors
///
/// Every fallible method returns [`crate::error::Error::Storage`] on a
/// transient backend failure. Callers (Recall, Duplicate Detector) must
/// degrade gracefully rather than propagate a panic.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upsert a memory.
    async fn save(&self, memory: Memory) -> Result<()>;

    /// Find a memory by id. Returns `None` if absent or archived.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Memory>>;

    /// Find memories scoped to a vendor.
    ///
    /// Returns memories where either `envelope.context.vendor_id ==
    /// vendor_id`, or the memory is a `VendorMemory` whose
    /// `payload.vendor_id == vendor_id` (spec §4.1).
    async fn find_by_vendor(&self, vendor_id: &str) -> Result<Vec<Memory>>;

    /// Find memories whose pattern matches the given pattern's type.
    async fn find_by_pattern(&self, pattern: &Pattern) -> Result<Vec<Memory>>;

    /// Find memories of a given type.
    async fn find_by_type(&self, memory_type: MemoryType) -> Result<Vec<Memory>>;

    /// Update a memory's confidence, clamped into `[0, 1]`.
    ///
    /// Per spec §4.1: subsequent reads may re-clamp to `[0.1, 1.0]`;
    /// implementations must not persist values below `0.1` via
    /// confidence-manager paths, but this raw setter is permitted to
    /// store the wider `[0, 1]` range transiently.
    async fn update_confidence(&self, id: Uuid, confidence: f64) -> Result<()>;

    /// Soft-delete a memory: it must no longer appear in any finder or
    /// vendor-isolation query, but remains retrievable via
    /// [`StorageBackend::all`] for audit purposes at the implementation's
    /// discretion.
    async fn archive(&self, id: Uuid) -> Result<()>;

    /// Hard-delete a memory.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// All non-archived memories.
    async fn all(&self) -> Result<Vec<Memory>>;

    /// Count of all non-archived memories.
    async fn count(&self) -> Result<usize>;
}

/// Whether a memory is scoped to `vendor_id`, per the `find_by_vendor`
/// contract in spec §4.1. Shared by every `StorageBackend` implementation
/// so the matching rule cannot drift between backends.
#[must_use]
pub fn matches_vendor(memory: &Memory, vendor_id: &str) -> bool {
    if memory.envelope.context.vendor_id.as_deref() == Some(vendor_id) {
        return true;
    }
    memory
        .payload
        .as_vendor()
        .is_some_and(|v| v.vendor_id == vendor_id)
}
