//! # State Manager
//!
//! Captures, serializes, and restores the full set of stored memories
//! under a bit-stable JSON contract (spec §6 "State serialization format").
//!
//! Grounded in the teacher's persistence subsystem shape
//! (a manager that snapshots, serializes, and restores store state),
//! re-targeted here at the whole memory store rather than a cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use crate::types::{CorrectionMemory, Memory, MemoryEnvelope, MemoryType, ResolutionMemory, VendorMemory};

const STATE_FORMAT_VERSION: &str = "1.0.0";

/// One memory, flattened into the bit-stable serialization contract:
/// the common envelope fields plus exactly one populated variant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedMemory {
    /// The common envelope.
    #[serde(flatten)]
    pub envelope: MemoryEnvelope,
    /// Present iff `envelope.memory_type == MemoryType::Vendor`.
    pub vendor_data: Option<VendorMemory>,
    /// Present iff `envelope.memory_type == MemoryType::Correction`.
    pub correction_data: Option<CorrectionMemory>,
    /// Present iff `envelope.memory_type == MemoryType::Resolution`.
    pub resolution_data: Option<ResolutionMemory>,
}

impl From<Memory> for SerializedMemory {
    fn from(memory: Memory) -> Self {
        let Memory { envelope, payload } = memory;
        let mut serialized = SerializedMemory {
            envelope,
            vendor_data: None,
            correction_data: None,
            resolution_data: None,
        };
        match payload {
            crate::types::MemoryPayload::Vendor(v) => serialized.vendor_data = Some(v),
            crate::types::MemoryPayload::Correction(c) => serialized.correction_data = Some(c),
            crate::types::MemoryPayload::Resolution(r) => serialized.resolution_data = Some(r),
        }
        serialized
    }
}

impl TryFrom<SerializedMemory> for Memory {
    type Error = Error;

    fn try_from(serialized: SerializedMemory) -> Result<Self> {
        let payload = match serialized.envelope.memory_type {
            MemoryType::Vendor => serialized
                .vendor_data
                .map(crate::types::MemoryPayload::Vendor),
            MemoryType::Correction => serialized
                .correction_data
                .map(crate::types::MemoryPayload::Correction),
            MemoryType::Resolution => serialized
                .resolution_data
                .map(crate::types::MemoryPayload::Resolution),
        }
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "missing variant payload for {:?} memory {}",
                serialized.envelope.memory_type, serialized.envelope.id
            ))
        })?;

        Ok(Memory {
            envelope: serialized.envelope,
            payload,
        })
    }
}

/// Aggregate counts and averages carried alongside a [`CapturedState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMetadata {
    /// Total number of memories in the snapshot.
    pub total_memories: usize,
    /// Count of memories per [`MemoryType`].
    pub memory_type_breakdown: HashMap<MemoryType, usize>,
    /// Mean confidence across all memories in the snapshot.
    pub average_confidence: f64,
}

/// A full, bit-stable snapshot of a memory store (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedState {
    /// Every non-archived memory in the store at capture time.
    pub memories: Vec<SerializedMemory>,
    /// When the snapshot was taken.
    pub captured_at: DateTime<Utc>,
    /// The format version, currently always `"1.0.0"`.
    pub version: String,
    /// Aggregate statistics over `memories`.
    pub metadata: StateMetadata,
}

/// Captures, serializes, and restores a [`StorageBackend`]'s contents.
pub struct StateManager {
    storage: Arc<dyn StorageBackend>,
}

impl StateManager {
    /// Construct a state manager over `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Snapshot every non-archived memory in the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if reading the store fails.
    pub async fn capture_state(&self, now: DateTime<Utc>) -> Result<CapturedState> {
        let memories = self.storage.all().await?;
        let total_memories = memories.len();

        let mut memory_type_breakdown: HashMap<MemoryType, usize> = HashMap::new();
        let mut confidence_sum = 0.0;
        for memory in &memories {
            *memory_type_breakdown
                .entry(memory.envelope.memory_type)
                .or_insert(0) += 1;
            confidence_sum += memory.envelope.confidence;
        }
        let average_confidence = if total_memories == 0 {
            0.0
        } else {
            confidence_sum / total_memories as f64
        };

        Ok(CapturedState {
            memories: memories.into_iter().map(SerializedMemory::from).collect(),
            captured_at: now,
            version: STATE_FORMAT_VERSION.to_string(),
            metadata: StateMetadata {
                total_memories,
                memory_type_breakdown,
                average_confidence,
            },
        })
    }

    /// Serialize a captured state to its bit-stable JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    pub fn serialize_state(state: &CapturedState) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(state)?)
    }

    /// Deserialize a previously serialized state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the bytes are not valid JSON
    /// for this contract, or [`Error::InvalidInput`] if a record is
    /// missing its expected variant payload.
    pub fn deserialize_state(bytes: &[u8]) -> Result<CapturedState> {
        let state: CapturedState = serde_json::from_slice(bytes)?;
        for serialized in &state.memories {
            let has_payload = match serialized.envelope.memory_type {
                MemoryType::Vendor => serialized.vendor_data.is_some(),
                MemoryType::Correction => serialized.correction_data.is_some(),
                MemoryType::Resolution => serialized.resolution_data.is_some(),
            };
            if !has_payload {
                return Err(Error::InvalidInput(format!(
                    "missing variant payload for {:?} memory {}",
                    serialized.envelope.memory_type, serialized.envelope.id
                )));
            }
        }
        Ok(state)
    }

    /// Restore every memory in `state` into the store, upserting each one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if a write fails, or
    /// [`Error::InvalidInput`] if a record is missing its variant payload.
    pub async fn restore_state(&self, state: CapturedState) -> Result<()> {
        for serialized in state.memories {
            let memory = Memory::try_from(serialized)?;
            self.storage.save(memory).await?;
        }
        Ok(())
    }

    /// Whether two captured states carry the same memories and metadata,
    /// ignoring the `captured_at` timestamp (two captures of the same
    /// store taken moments apart should compare equal).
    #[must_use]
    pub fn compare_states(a: &CapturedState, b: &CapturedState) -> bool {
        a.version == b.version && a.metadata == b.metadata && a.memories == b.memories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStorage;
    use crate::types::{MemoryContext, Pattern};

    #[tokio::test]
    async fn capture_then_serialize_then_deserialize_round_trips() {
        let storage = Arc::new(InMemoryStorage::new());
        let memory = Memory::new_vendor(
            "vendor-1",
            MemoryContext::default(),
            Pattern::new("field_mapping", 0.5),
            0.7,
            Utc::now(),
        )
        .unwrap();
        storage.save(memory).await.unwrap();

        let manager = StateManager::new(storage);
        let now = Utc::now();
        let state = manager.capture_state(now).await.unwrap();
        assert_eq!(state.metadata.total_memories, 1);
        assert_eq!(state.version, "1.0.0");

        let bytes = StateManager::serialize_state(&state).unwrap();
        let restored = StateManager::deserialize_state(&bytes).unwrap();
        assert_eq!(state, restored);
    }

    #[tokio::test]
    async fn restore_state_writes_memories_back_into_storage() {
        let source = Arc::new(InMemoryStorage::new());
        let memory = Memory::new_vendor(
            "vendor-1",
            MemoryContext::default(),
            Pattern::new("field_mapping", 0.5),
            0.7,
            Utc::now(),
        )
        .unwrap();
        source.save(memory).await.unwrap();
        let state = StateManager::new(source).capture_state(Utc::now()).await.unwrap();

        let target = Arc::new(InMemoryStorage::new());
        let manager = StateManager::new(target.clone());
        manager.restore_state(state).await.unwrap();

        assert_eq!(target.count().await.unwrap(), 1);
    }

    #[test]
    fn deserialize_rejects_missing_variant_payload() {
        let json = serde_json::json!({
            "memories": [{
                "id": "00000000-0000-0000-0000-000000000000",
                "memoryType": "vendor",
                "confidence": 0.5,
                "pattern": {"patternType": "field_mapping", "patternData": {}, "threshold": 0.5},
                "createdAt": "2024-01-01T00:00:00Z",
                "lastUsed": "2024-01-01T00:00:00Z",
                "usageCount": 0,
                "successRate": 0.0,
                "context": {"vendorId": null, "invoiceCharacteristics": {"complexity": "moderate", "language": "en", "documentFormat": "pdf", "extractionQuality": 1.0}, "historicalContext": {}, "environmentalFactors": {}},
                "vendorData": null,
                "correctionData": null,
                "resolutionData": null
            }],
            "capturedAt": "2024-01-01T00:00:00Z",
            "version": "1.0.0",
            "metadata": {"totalMemories": 1, "memoryTypeBreakdown": {}, "averageConfidence": 0.5}
        });
        let bytes = serde_json::to_vec(&json).unwrap();
        assert!(StateManager::deserialize_state(&bytes).is_err());
    }

    #[tokio::test]
    async fn compare_states_ignores_captured_at() {
        let storage = Arc::new(InMemoryStorage::new());
        let manager = StateManager::new(storage);
        let a = manager.capture_state(Utc::now()).await.unwrap();
        let b = manager
            .capture_state("2030-01-01T00:00:00Z".parse().unwrap())
            .await
            .unwrap();
        assert!(StateManager::compare_states(&a, &b));
    }
}
