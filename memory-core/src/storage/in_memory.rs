//! An in-process reference implementation of [`StorageBackend`].
//!
//! Mirrors the teacher's `episodes_fallback` in-memory maps
//! (`memory-core/src/memory/core/struct_priv.rs`): used by unit tests and
//! as the default when no durable backend is configured. Save and
//! archive/delete all happen under one write-lock acquisition, which is
//! what makes the atomicity contract of spec §4.1 trivial here — there
//! is no separate envelope write to race with a payload write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{matches_vendor, StorageBackend};
use crate::error::Result;
use crate::types::{Memory, MemoryType, Pattern};

struct Entry {
    memory: Memory,
    archived: bool,
}

/// An in-memory, process-local [`StorageBackend`].
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl InMemoryStorage {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    async fn save(&self, memory: Memory) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(
            memory.envelope.id,
            Entry {
                memory,
                archived: false,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Memory>> {
        let entries = self.entries.read();
        Ok(entries
            .get(&id)
            .filter(|e| !e.archived)
            .map(|e| e.memory.clone()))
    }

    async fn find_by_vendor(&self, vendor_id: &str) -> Result<Vec<Memory>> {
        let entries = self.entries.read();
        Ok(entries
            .values()
            .filter(|e| !e.archived)
            .map(|e| &e.memory)
            .filter(|m| matches_vendor(m, vendor_id))
            .cloned()
            .collect())
    }

    async fn find_by_pattern(&self, pattern: &Pattern) -> Result<Vec<Memory>> {
        let entries = self.entries.read();
        Ok(entries
            .values()
            .filter(|e| !e.archived)
            .map(|e| &e.memory)
            .filter(|m| m.envelope.pattern.pattern_type == pattern.pattern_type)
            .cloned()
            .collect())
    }

    async fn find_by_type(&self, memory_type: MemoryType) -> Result<Vec<Memory>> {
        let entries = self.entries.read();
        Ok(entries
            .values()
            .filter(|e| !e.archived)
            .map(|e| &e.memory)
            .filter(|m| m.envelope.memory_type == memory_type)
            .cloned()
            .collect())
    }

    async fn update_confidence(&self, id: Uuid, confidence: f64) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(&id) {
            // Raw setter: clamp to [0, 1] only, per spec §4.1. Callers
            // that want the [0.1, 1.0] memory-visible floor go through
            // `crate::confidence::reinforce`/`decay` first.
            entry.memory.envelope.confidence = confidence.clamp(0.0, 1.0);
        }
        Ok(())
    }

    async fn archive(&self, id: Uuid) -> Result<()> {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(&id) {
            entry.archived = true;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut entries = self.entries.write();
        entries.remove(&id);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Memory>> {
        let entries = self.entries.read();
        Ok(entries
            .values()
            .filter(|e| !e.archived)
            .map(|e| e.memory.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let entries = self.entries.read();
        Ok(entries.values().filter(|e| !e.archived).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryContext, Pattern};
    use chrono::Utc;

    fn vendor_memory(vendor_id: &str) -> Memory {
        Memory::new_vendor(
            vendor_id,
            MemoryContext::default(),
            Pattern::new("field_mapping", 0.5),
            0.7,
            Utc::now(),
        )
        .expect("valid")
    }

    #[tokio::test]
    async fn save_then_find_by_id_round_trips() {
        let storage = InMemoryStorage::new();
        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory.clone()).await.unwrap();
        let found = storage.find_by_id(id).await.unwrap();
        assert_eq!(found, Some(memory));
    }

    #[tokio::test]
    async fn archived_memories_are_excluded_from_all_finders() {
        let storage = InMemoryStorage::new();
        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory).await.unwrap();
        storage.archive(id).await.unwrap();

        assert_eq!(storage.find_by_id(id).await.unwrap(), None);
        assert!(storage.find_by_vendor("vendor-1").await.unwrap().is_empty());
        assert!(storage.all().await.unwrap().is_empty());
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_by_vendor_matches_envelope_context_or_vendor_payload() {
        let storage = InMemoryStorage::new();
        storage.save(vendor_memory("vendor-1")).await.unwrap();
        storage.save(vendor_memory("vendor-2")).await.unwrap();

        let found = storage.find_by_vendor("vendor-1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].payload.as_vendor().unwrap().vendor_id,
            "vendor-1"
        );
    }

    #[tokio::test]
    async fn delete_removes_memory_entirely() {
        let storage = InMemoryStorage::new();
        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory).await.unwrap();
        storage.delete(id).await.unwrap();
        assert_eq!(storage.find_by_id(id).await.unwrap(), None);
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_confidence_clamps_to_unit_interval() {
        let storage = InMemoryStorage::new();
        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory).await.unwrap();
        storage.update_confidence(id, 5.0).await.unwrap();
        let found = storage.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.envelope.confidence, 1.0);
    }

    #[tokio::test]
    async fn save_is_upsert() {
        let storage = InMemoryStorage::new();
        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory.clone()).await.unwrap();
        let updated = memory.with_confidence(0.42);
        storage.save(updated.clone()).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 1);
        assert_eq!(storage.find_by_id(id).await.unwrap(), Some(updated));
    }
}
