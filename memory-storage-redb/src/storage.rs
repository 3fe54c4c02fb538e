//! [`RedbStorage`]: a durable [`StorageBackend`] over an embedded redb
//! database.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use invoice_memory_core::error::{Error, Result};
use invoice_memory_core::storage::{matches_vendor, StorageBackend};
use invoice_memory_core::types::{Memory, MemoryType, Pattern};
use redb::{Database, ReadableTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::tables::{MEMORIES_TABLE, SCHEMA_VERSION, SCHEMA_VERSION_KEY, TYPE_INDEX_TABLE, VENDOR_INDEX_TABLE};

/// Maximum size of a single serialized memory entry (1MB).
///
/// Prevents a malformed or adversarial write from exhausting memory on
/// deserialization, mirroring the teacher's `MAX_EPISODE_SIZE` guard.
pub const MAX_ENTRY_SIZE: usize = 1_000_000;

/// Timeout applied to every blocking redb operation.
const DB_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// The on-disk unit stored per memory id: the memory plus the
/// soft-delete flag, so archive/delete/save all touch exactly one
/// primary-table entry and stay atomic with respect to a concurrent
/// reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    memory: Memory,
    archived: bool,
}

/// Run a blocking redb operation on the blocking thread pool, bounded by
/// [`DB_OPERATION_TIMEOUT`].
async fn with_db_timeout<T, F>(operation: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(DB_OPERATION_TIMEOUT, tokio::task::spawn_blocking(operation)).await
    {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(Error::Storage(format!("task join error: {join_err}"))),
        Err(_) => Err(Error::Storage(format!(
            "database operation timed out after {DB_OPERATION_TIMEOUT:?}"
        ))),
    }
}

fn encode_entry(entry: &StoredEntry) -> Result<Vec<u8>> {
    let bytes = postcard::to_allocvec(entry)
        .map_err(|e| Error::Storage(format!("failed to serialize memory: {e}")))?;
    if bytes.len() > MAX_ENTRY_SIZE {
        return Err(Error::Storage(format!(
            "serialized memory of {} bytes exceeds the {MAX_ENTRY_SIZE} byte limit",
            bytes.len()
        )));
    }
    Ok(bytes)
}

fn decode_entry(bytes: &[u8]) -> Result<StoredEntry> {
    if bytes.len() > MAX_ENTRY_SIZE {
        return Err(Error::Storage(format!(
            "stored memory of {} bytes exceeds the {MAX_ENTRY_SIZE} byte limit",
            bytes.len()
        )));
    }
    postcard::from_bytes(bytes).map_err(|e| Error::Storage(format!("failed to deserialize memory: {e}")))
}

fn encode_id_set(ids: &HashSet<Uuid>) -> Result<Vec<u8>> {
    let ids: Vec<Uuid> = ids.iter().copied().collect();
    postcard::to_allocvec(&ids).map_err(|e| Error::Storage(format!("failed to serialize index entry: {e}")))
}

fn decode_id_set(bytes: &[u8]) -> Result<HashSet<Uuid>> {
    let ids: Vec<Uuid> = postcard::from_bytes(bytes)
        .map_err(|e| Error::Storage(format!("failed to deserialize index entry: {e}")))?;
    Ok(ids.into_iter().collect())
}

/// The single vendor an index entry is keyed by for `memory`, matching
/// the same vendor `memory` would be found under via
/// [`matches_vendor`]: `context.vendor_id` if set, else the vendor
/// payload's id for a `VendorMemory`.
fn vendor_key(memory: &Memory) -> Option<String> {
    memory
        .envelope
        .context
        .vendor_id
        .clone()
        .or_else(|| memory.payload.as_vendor().map(|v| v.vendor_id.clone()))
}

fn type_key(memory_type: MemoryType) -> &'static str {
    match memory_type {
        MemoryType::Vendor => "vendor",
        MemoryType::Correction => "correction",
        MemoryType::Resolution => "resolution",
    }
}

/// A durable, redb-backed [`StorageBackend`].
///
/// Maintains two secondary indexes — by vendor id and by memory type —
/// as their own redb tables of `key -> postcard(Vec<Uuid>)`, rebuilt
/// transactionally alongside every primary-table write, per the
/// teacher's precedent of resolving "what would be SQL indexes" as
/// plain embedded-KV tables. `find_by_pattern` has no such index: the
/// pattern space is open-ended and unbounded, so it falls back to a
/// full-table scan, mirroring the teacher's `get_all_episodes` +
/// caller-side filter idiom (`episodes.rs`).
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open (creating if absent) a redb database at `path`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use invoice_memory_storage_redb::RedbStorage;
    /// use std::path::Path;
    ///
    /// # async fn example() -> invoice_memory_core::error::Result<()> {
    /// let storage = RedbStorage::open(Path::new("./memories.redb")).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening redb memory store");
        let path_buf = path.to_path_buf();
        let db = with_db_timeout(move || {
            Database::create(&path_buf)
                .map_err(|e| Error::Storage(format!("failed to open redb database: {e}")))
        })
        .await?;

        let storage = Self { db: Arc::new(db) };
        storage.initialize().await?;
        Ok(storage)
    }

    async fn initialize(&self) -> Result<()> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let write_txn = db
                .begin_write()
                .map_err(|e| Error::Storage(format!("failed to begin write transaction: {e}")))?;
            {
                let mut memories = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;
                write_txn
                    .open_table(VENDOR_INDEX_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open vendor index table: {e}")))?;
                write_txn
                    .open_table(TYPE_INDEX_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open type index table: {e}")))?;

                if memories
                    .get(SCHEMA_VERSION_KEY)
                    .map_err(|e| Error::Storage(format!("failed to read schema version: {e}")))?
                    .is_none()
                {
                    memories
                        .insert(SCHEMA_VERSION_KEY, SCHEMA_VERSION.as_bytes())
                        .map_err(|e| Error::Storage(format!("failed to write schema version: {e}")))?;
                }
            }
            write_txn
                .commit()
                .map_err(|e| Error::Storage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await?;
        debug!("initialized redb memory store tables");
        Ok(())
    }

    /// Every stored entry, including archived ones, with the reserved
    /// schema-version row filtered out. Only used by `find_by_pattern`,
    /// which has no secondary index to consult.
    async fn all_entries(&self) -> Result<Vec<(Uuid, StoredEntry)>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db
                .begin_read()
                .map_err(|e| Error::Storage(format!("failed to begin read transaction: {e}")))?;
            let table = read_txn
                .open_table(MEMORIES_TABLE)
                .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;

            let mut entries = Vec::new();
            for row in table
                .iter()
                .map_err(|e| Error::Storage(format!("failed to iterate memories table: {e}")))?
            {
                let (key, value) =
                    row.map_err(|e| Error::Storage(format!("failed to read memory row: {e}")))?;
                let key = key.value();
                if key == SCHEMA_VERSION_KEY {
                    continue;
                }
                let id = Uuid::parse_str(key)
                    .map_err(|e| Error::Storage(format!("corrupt memory id {key}: {e}")))?;
                let entry = decode_entry(value.value())?;
                entries.push((id, entry));
            }
            Ok(entries)
        })
        .await
    }

    /// Look up memory ids via a secondary index, then resolve each to
    /// its current (possibly archived) entry from the primary table.
    async fn find_via_index(
        &self,
        table_def: redb::TableDefinition<'static, &'static str, &'static [u8]>,
        key: String,
    ) -> Result<Vec<(Uuid, StoredEntry)>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db
                .begin_read()
                .map_err(|e| Error::Storage(format!("failed to begin read transaction: {e}")))?;

            let index = read_txn
                .open_table(table_def)
                .map_err(|e| Error::Storage(format!("failed to open index table: {e}")))?;
            let ids: HashSet<Uuid> = match index
                .get(key.as_str())
                .map_err(|e| Error::Storage(format!("failed to read index entry: {e}")))?
            {
                Some(guard) => decode_id_set(guard.value())?,
                None => return Ok(Vec::new()),
            };

            let memories = read_txn
                .open_table(MEMORIES_TABLE)
                .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;

            let mut entries = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(guard) = memories
                    .get(id.to_string().as_str())
                    .map_err(|e| Error::Storage(format!("failed to get memory: {e}")))?
                {
                    entries.push((id, decode_entry(guard.value())?));
                }
            }
            Ok(entries)
        })
        .await
    }

    /// Add `id` to the `Vec<Uuid>` stored under `key` in `table_def`,
    /// creating the entry if absent. Must be called inside an open
    /// write transaction.
    fn index_add(
        write_txn: &redb::WriteTransaction,
        table_def: redb::TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        id: Uuid,
    ) -> Result<()> {
        let mut table = write_txn
            .open_table(table_def)
            .map_err(|e| Error::Storage(format!("failed to open index table: {e}")))?;
        let mut ids = match table
            .get(key)
            .map_err(|e| Error::Storage(format!("failed to read index entry: {e}")))?
        {
            Some(guard) => decode_id_set(guard.value())?,
            None => HashSet::new(),
        };
        ids.insert(id);
        let bytes = encode_id_set(&ids)?;
        table
            .insert(key, bytes.as_slice())
            .map_err(|e| Error::Storage(format!("failed to write index entry: {e}")))?;
        Ok(())
    }

    /// Remove `id` from the `Vec<Uuid>` stored under `key` in
    /// `table_def`, dropping the row entirely once empty. Must be
    /// called inside an open write transaction.
    fn index_remove(
        write_txn: &redb::WriteTransaction,
        table_def: redb::TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        id: Uuid,
    ) -> Result<()> {
        let mut table = write_txn
            .open_table(table_def)
            .map_err(|e| Error::Storage(format!("failed to open index table: {e}")))?;
        let Some(guard) = table
            .get(key)
            .map_err(|e| Error::Storage(format!("failed to read index entry: {e}")))?
        else {
            return Ok(());
        };
        let mut ids = decode_id_set(guard.value())?;
        drop(guard);
        ids.remove(&id);
        if ids.is_empty() {
            table
                .remove(key)
                .map_err(|e| Error::Storage(format!("failed to remove index entry: {e}")))?;
        } else {
            let bytes = encode_id_set(&ids)?;
            table
                .insert(key, bytes.as_slice())
                .map_err(|e| Error::Storage(format!("failed to write index entry: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for RedbStorage {
    async fn save(&self, memory: Memory) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = memory.envelope.id;
        let id_str = id.to_string();
        let new_vendor_key = vendor_key(&memory);
        let new_type_key = type_key(memory.envelope.memory_type);
        let bytes = encode_entry(&StoredEntry {
            memory,
            archived: false,
        })?;

        with_db_timeout(move || {
            let write_txn = db
                .begin_write()
                .map_err(|e| Error::Storage(format!("failed to begin write transaction: {e}")))?;

            let previous = {
                let table = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;
                table
                    .get(id_str.as_str())
                    .map_err(|e| Error::Storage(format!("failed to get memory: {e}")))?
                    .map(|guard| decode_entry(guard.value()))
                    .transpose()?
            };

            if let Some(previous) = &previous {
                let old_vendor_key = vendor_key(&previous.memory);
                if old_vendor_key != new_vendor_key {
                    if let Some(old_key) = &old_vendor_key {
                        Self::index_remove(&write_txn, VENDOR_INDEX_TABLE, old_key, id)?;
                    }
                }
                let old_type_key = type_key(previous.memory.envelope.memory_type);
                if old_type_key != new_type_key {
                    Self::index_remove(&write_txn, TYPE_INDEX_TABLE, old_type_key, id)?;
                }
            }

            {
                let mut table = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;
                table
                    .insert(id_str.as_str(), bytes.as_slice())
                    .map_err(|e| Error::Storage(format!("failed to insert memory: {e}")))?;
            }

            if let Some(key) = &new_vendor_key {
                Self::index_add(&write_txn, VENDOR_INDEX_TABLE, key, id)?;
            }
            Self::index_add(&write_txn, TYPE_INDEX_TABLE, new_type_key, id)?;

            write_txn
                .commit()
                .map_err(|e| Error::Storage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Memory>> {
        let db = Arc::clone(&self.db);
        let id_str = id.to_string();
        let bytes = with_db_timeout(move || {
            let read_txn = db
                .begin_read()
                .map_err(|e| Error::Storage(format!("failed to begin read transaction: {e}")))?;
            let table = read_txn
                .open_table(MEMORIES_TABLE)
                .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;
            Ok(table
                .get(id_str.as_str())
                .map_err(|e| Error::Storage(format!("failed to get memory: {e}")))?
                .map(|guard| guard.value().to_vec()))
        })
        .await?;

        match bytes {
            Some(bytes) => {
                let entry = decode_entry(&bytes)?;
                Ok((!entry.archived).then_some(entry.memory))
            }
            None => Ok(None),
        }
    }

    async fn find_by_vendor(&self, vendor_id: &str) -> Result<Vec<Memory>> {
        let entries = self
            .find_via_index(VENDOR_INDEX_TABLE, vendor_id.to_string())
            .await?;
        Ok(entries
            .into_iter()
            .filter(|(_, e)| !e.archived)
            .map(|(_, e)| e.memory)
            .filter(|m| matches_vendor(m, vendor_id))
            .collect())
    }

    async fn find_by_pattern(&self, pattern: &Pattern) -> Result<Vec<Memory>> {
        let entries = self.all_entries().await?;
        Ok(entries
            .into_iter()
            .filter(|(_, e)| !e.archived)
            .map(|(_, e)| e.memory)
            .filter(|m| m.envelope.pattern.pattern_type == pattern.pattern_type)
            .collect())
    }

    async fn find_by_type(&self, memory_type: MemoryType) -> Result<Vec<Memory>> {
        let entries = self
            .find_via_index(TYPE_INDEX_TABLE, type_key(memory_type).to_string())
            .await?;
        Ok(entries
            .into_iter()
            .filter(|(_, e)| !e.archived)
            .map(|(_, e)| e.memory)
            .filter(|m| m.envelope.memory_type == memory_type)
            .collect())
    }

    async fn update_confidence(&self, id: Uuid, confidence: f64) -> Result<()> {
        let Some(memory) = self.find_by_id(id).await? else {
            warn!(%id, "update_confidence called for unknown or archived memory");
            return Ok(());
        };
        let updated = memory.with_confidence(confidence.clamp(0.0, 1.0));
        self.save(updated).await
    }

    async fn archive(&self, id: Uuid) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id_str = id.to_string();
        with_db_timeout(move || {
            let write_txn = db
                .begin_write()
                .map_err(|e| Error::Storage(format!("failed to begin write transaction: {e}")))?;
            {
                let mut table = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;
                if let Some(guard) = table
                    .get(id_str.as_str())
                    .map_err(|e| Error::Storage(format!("failed to get memory: {e}")))?
                {
                    let mut entry = decode_entry(guard.value())?;
                    entry.archived = true;
                    let bytes = encode_entry(&entry)?;
                    drop(guard);
                    table
                        .insert(id_str.as_str(), bytes.as_slice())
                        .map_err(|e| Error::Storage(format!("failed to archive memory: {e}")))?;
                }
            }
            write_txn
                .commit()
                .map_err(|e| Error::Storage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id_str = id.to_string();
        with_db_timeout(move || {
            let write_txn = db
                .begin_write()
                .map_err(|e| Error::Storage(format!("failed to begin write transaction: {e}")))?;

            let previous = {
                let table = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;
                table
                    .get(id_str.as_str())
                    .map_err(|e| Error::Storage(format!("failed to get memory: {e}")))?
                    .map(|guard| decode_entry(guard.value()))
                    .transpose()?
            };

            if let Some(previous) = &previous {
                if let Some(key) = vendor_key(&previous.memory) {
                    Self::index_remove(&write_txn, VENDOR_INDEX_TABLE, &key, id)?;
                }
                Self::index_remove(
                    &write_txn,
                    TYPE_INDEX_TABLE,
                    type_key(previous.memory.envelope.memory_type),
                    id,
                )?;
            }

            {
                let mut table = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::Storage(format!("failed to open memories table: {e}")))?;
                table
                    .remove(id_str.as_str())
                    .map_err(|e| Error::Storage(format!("failed to delete memory: {e}")))?;
            }

            write_txn
                .commit()
                .map_err(|e| Error::Storage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn all(&self) -> Result<Vec<Memory>> {
        let entries = self.all_entries().await?;
        Ok(entries
            .into_iter()
            .filter(|(_, e)| !e.archived)
            .map(|(_, e)| e.memory)
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let entries = self.all_entries().await?;
        Ok(entries.into_iter().filter(|(_, e)| !e.archived).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoice_memory_core::types::MemoryContext;
    use tempfile::tempdir;

    fn vendor_memory(vendor_id: &str) -> Memory {
        Memory::new_vendor(
            vendor_id,
            MemoryContext::default(),
            Pattern::new("field_mapping", 0.5),
            0.7,
            chrono::Utc::now(),
        )
        .expect("valid")
    }

    #[tokio::test]
    async fn save_then_find_by_id_round_trips() {
        let dir = tempdir().expect("tempdir");
        let storage = RedbStorage::open(&dir.path().join("test.redb"))
            .await
            .expect("open");

        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory.clone()).await.expect("save");

        let found = storage.find_by_id(id).await.expect("find");
        assert_eq!(found, Some(memory));
    }

    #[tokio::test]
    async fn archived_memories_are_excluded_from_all_finders() {
        let dir = tempdir().expect("tempdir");
        let storage = RedbStorage::open(&dir.path().join("test.redb"))
            .await
            .expect("open");

        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory).await.expect("save");
        storage.archive(id).await.expect("archive");

        assert_eq!(storage.find_by_id(id).await.expect("find"), None);
        assert!(storage
            .find_by_vendor("vendor-1")
            .await
            .expect("find_by_vendor")
            .is_empty());
        assert!(storage.all().await.expect("all").is_empty());
        assert_eq!(storage.count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn find_by_vendor_isolates_other_vendors() {
        let dir = tempdir().expect("tempdir");
        let storage = RedbStorage::open(&dir.path().join("test.redb"))
            .await
            .expect("open");

        storage.save(vendor_memory("vendor-1")).await.expect("save");
        storage.save(vendor_memory("vendor-2")).await.expect("save");

        let found = storage.find_by_vendor("vendor-1").await.expect("find_by_vendor");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload.as_vendor().unwrap().vendor_id, "vendor-1");
    }

    #[tokio::test]
    async fn find_by_type_uses_the_type_index() {
        let dir = tempdir().expect("tempdir");
        let storage = RedbStorage::open(&dir.path().join("test.redb"))
            .await
            .expect("open");

        storage.save(vendor_memory("vendor-1")).await.expect("save");
        storage.save(vendor_memory("vendor-2")).await.expect("save");

        let found = storage
            .find_by_type(MemoryType::Vendor)
            .await
            .expect("find_by_type");
        assert_eq!(found.len(), 2);

        let found = storage
            .find_by_type(MemoryType::Correction)
            .await
            .expect("find_by_type");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn save_is_upsert_and_leaves_indexes_consistent() {
        let dir = tempdir().expect("tempdir");
        let storage = RedbStorage::open(&dir.path().join("test.redb"))
            .await
            .expect("open");

        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory.clone()).await.expect("save");
        let updated = memory.with_confidence(0.42);
        storage.save(updated.clone()).await.expect("save again");

        assert_eq!(storage.count().await.expect("count"), 1);
        assert_eq!(storage.find_by_id(id).await.expect("find"), Some(updated));
        assert_eq!(
            storage.find_by_vendor("vendor-1").await.expect("find_by_vendor").len(),
            1
        );
    }

    #[tokio::test]
    async fn reopening_the_same_path_preserves_data() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("test.redb");

        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        {
            let storage = RedbStorage::open(&path).await.expect("open");
            storage.save(memory.clone()).await.expect("save");
        }

        let storage = RedbStorage::open(&path).await.expect("reopen");
        assert_eq!(storage.find_by_id(id).await.expect("find"), Some(memory));
    }

    #[tokio::test]
    async fn delete_removes_memory_and_index_entries() {
        let dir = tempdir().expect("tempdir");
        let storage = RedbStorage::open(&dir.path().join("test.redb"))
            .await
            .expect("open");

        let memory = vendor_memory("vendor-1");
        let id = memory.envelope.id;
        storage.save(memory).await.expect("save");
        storage.delete(id).await.expect("delete");

        assert_eq!(storage.find_by_id(id).await.expect("find"), None);
        assert_eq!(storage.count().await.expect("count"), 0);
        assert!(storage
            .find_by_vendor("vendor-1")
            .await
            .expect("find_by_vendor")
            .is_empty());
    }
}
