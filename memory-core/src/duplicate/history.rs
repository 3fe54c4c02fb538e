//! The invoice-history collaborator the duplicate detector queries
//! (spec §4.6 "Query": "all prior invoices with identical vendorId").
//!
//! Kept distinct from [`crate::storage::StorageBackend`], which stores
//! *memories*, not raw invoice records.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::InvoiceRef;

/// Supplies prior invoices for duplicate-candidate lookup.
#[async_trait]
pub trait InvoiceHistory: Send + Sync {
    /// All prior invoices issued by `vendor_id` (exact, case-sensitive
    /// match).
    async fn invoices_for_vendor(&self, vendor_id: &str) -> Result<Vec<InvoiceRef>>;
}

/// An in-process reference [`InvoiceHistory`], used by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceHistory {
    invoices: std::sync::Arc<parking_lot::RwLock<Vec<InvoiceRef>>>,
}

impl InMemoryInvoiceHistory {
    /// Construct an empty invoice history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invoice as part of prior history.
    pub fn record(&self, invoice: InvoiceRef) {
        self.invoices.write().push(invoice);
    }
}

#[async_trait]
impl InvoiceHistory for InMemoryInvoiceHistory {
    async fn invoices_for_vendor(&self, vendor_id: &str) -> Result<Vec<InvoiceRef>> {
        Ok(self
            .invoices
            .read()
            .iter()
            .filter(|inv| inv.vendor_id == vendor_id)
            .cloned()
            .collect())
    }
}
