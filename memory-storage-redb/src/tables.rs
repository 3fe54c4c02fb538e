//! Table definitions and schema constants for the redb backend.

use redb::TableDefinition;

/// The primary table: memory id (its string form) to a
/// postcard-serialized [`crate::storage::StoredEntry`] — envelope and
/// payload serialized together in one write, which is what keeps the
/// atomicity contract of spec §4.1 trivial: there is no separate
/// envelope write to race with a payload write.
pub(crate) const MEMORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");

/// Secondary index: vendor id to a postcard-encoded `Vec<Uuid>` of
/// memory ids scoped to that vendor (either via `context.vendor_id` or,
/// for `VendorMemory`, `payload.vendor_id`). Rebuilt transactionally
/// alongside every primary-table write so it never drifts out of sync.
pub(crate) const VENDOR_INDEX_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("vendor_index");

/// Secondary index: memory type tag (`"vendor"` / `"correction"` /
/// `"resolution"`) to a postcard-encoded `Vec<Uuid>` of memory ids of
/// that type.
pub(crate) const TYPE_INDEX_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("type_index");

/// Current on-disk schema version, stored in the memories table under
/// [`SCHEMA_VERSION_KEY`] so a future migration can detect older stores.
pub(crate) const SCHEMA_VERSION: &str = "1.0.0";

/// Reserved key under which the schema version is recorded. Not a valid
/// UUID string, so it can never collide with a memory id.
pub(crate) const SCHEMA_VERSION_KEY: &str = "__schema_version__";
