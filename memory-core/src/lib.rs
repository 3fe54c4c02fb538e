#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Invoice Memory Core
//!
//! The memory subsystem of an adaptive invoice-normalization engine: a
//! durable store of learned vendor patterns, human corrections, and
//! discrepancy resolutions, plus the engines that recall, reinforce,
//! learn, and deduplicate against it.
//!
//! ## Module Organization
//!
//! - [`types`]: the memory envelope, its three variant payloads
//!   (`VendorMemory` / `CorrectionMemory` / `ResolutionMemory`), and the
//!   context types every engine shares.
//! - [`storage`]: the [`storage::StorageBackend`] trait plus an in-process
//!   reference implementation. See the `invoice-memory-storage-redb` crate
//!   for a durable backend.
//! - [`confidence`]: pure reinforcement and decay functions.
//! - [`recall`]: ranks stored memories against an invoice context.
//! - [`recognizer`]: mines vendor-scoped field mappings, VAT behavior, and
//!   currency/date format families, with a strict vendor-isolation
//!   contract.
//! - [`learning`]: turns human corrections into new or reinforced
//!   memories, recognizing repeated patterns across corrections.
//! - [`duplicate`]: flags candidate duplicate invoices by vendor, invoice
//!   number, and date proximity.
//! - [`state`]: captures, serializes, and restores a full memory store
//!   snapshot under a bit-stable JSON contract.
//! - [`audit`]: the append-only audit trail every public engine call
//!   emits.
//! - [`error`]: the shared error taxonomy.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use invoice_memory_core::recall::{RecallEngine, RecallConfig, SystemClock};
//! use invoice_memory_core::storage::InMemoryStorage;
//! use invoice_memory_core::types::{
//!     ComplexityLevel, Environment, InvoiceContext, InvoiceRef, Priority,
//!     RelationshipType, VendorInfo,
//! };
//!
//! # async fn example() -> invoice_memory_core::error::Result<()> {
//! let storage = Arc::new(InMemoryStorage::new());
//! let recall = RecallEngine::new(storage, RecallConfig::default(), Arc::new(SystemClock));
//!
//! let ctx = InvoiceContext {
//!     invoice: InvoiceRef {
//!         vendor_id: "vendor-123".to_string(),
//!         invoice_number: "INV-2024-001".to_string(),
//!         invoice_date: None,
//!         amount: None,
//!     },
//!     vendor_info: VendorInfo {
//!         id: "vendor-123".to_string(),
//!         name: "Acme GmbH".to_string(),
//!         language: "de".to_string(),
//!         relationship_type: RelationshipType::Regular,
//!     },
//!     environment: Environment {
//!         timestamp: Utc::now(),
//!         priority: Priority::Normal,
//!         time_constraints: None,
//!         regulatory_context: None,
//!     },
//!     history: vec![],
//!     language: "de".to_string(),
//!     complexity: ComplexityLevel::Moderate,
//!     extraction_quality: 0.95,
//! };
//!
//! let result = recall.recall(&ctx).await;
//! println!("{}", result.reasoning);
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod confidence;
pub mod duplicate;
pub mod error;
pub mod learning;
pub mod recall;
pub mod recognizer;
pub mod state;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
