//! # Invoice Memory Storage — redb
//!
//! A durable [`invoice_memory_core::storage::StorageBackend`] backed by
//! [redb](https://docs.rs/redb), an embedded key-value store. Intended
//! as the production storage choice when the in-process reference
//! implementation in `invoice-memory-core` isn't durable enough.
//!
//! ## Example
//!
//! ```no_run
//! use invoice_memory_storage_redb::RedbStorage;
//! use std::path::Path;
//!
//! # async fn example() -> invoice_memory_core::error::Result<()> {
//! let storage = RedbStorage::open(Path::new("./memories.redb")).await?;
//! # Ok(())
//! # }
//! ```

mod storage;
mod tables;

pub use storage::{RedbStorage, MAX_ENTRY_SIZE};
