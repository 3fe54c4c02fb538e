//! The minimal invoice reference shared by recall and duplicate detection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The handful of invoice fields the memory subsystem needs to reason
/// about, independent of whether the invoice is raw or normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRef {
    /// The vendor this invoice was issued by.
    pub vendor_id: String,
    /// The vendor-assigned invoice number.
    pub invoice_number: String,
    /// The invoice date, if known.
    pub invoice_date: Option<NaiveDate>,
    /// The total invoice amount, if known.
    pub amount: Option<f64>,
}

impl InvoiceRef {
    /// Days between this invoice's date and `other`'s, if both are known.
    #[must_use]
    pub fn days_difference(&self, other: &InvoiceRef) -> Option<i64> {
        match (self.invoice_date, other.invoice_date) {
            (Some(a), Some(b)) => Some((a - b).num_days().abs()),
            _ => None,
        }
    }
}
