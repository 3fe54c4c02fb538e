//! The memory envelope and the tagged variant it wraps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::MemoryContext;
use super::correction::CorrectionMemory;
use super::pattern::Pattern;
use super::resolution::ResolutionMemory;
use super::vendor::VendorMemory;
use crate::error::{Error, Result};

/// The lower bound every memory-visible confidence value is clamped to.
///
/// Per the specification's Open Question resolution: storage may
/// transiently carry values down to `0.0`, but no value below this floor
/// is ever returned from a memory-visible operation.
pub const MIN_CONFIDENCE: f64 = 0.1;

/// The upper bound every confidence value is clamped to.
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Clamp a confidence value into the memory-visible range `[0.1, 1.0]`.
#[must_use]
pub fn clamp_confidence(value: f64) -> f64 {
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// The three kinds of memory this system learns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Vendor,
    Correction,
    Resolution,
}

/// Fields common to every memory, regardless of its variant payload.
///
/// See Design Note (spec §9): this re-architects the source's class
/// hierarchy as a tagged variant with one shared envelope, rather than
/// an abstract base class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEnvelope {
    /// Stable, unique identifier.
    pub id: Uuid,
    /// Which variant this envelope wraps.
    pub memory_type: MemoryType,
    /// Confidence, always within `[0.1, 1.0]` once read through the core.
    pub confidence: f64,
    /// The structural pattern this memory was recognized from.
    pub pattern: Pattern,
    /// When this memory was created.
    pub created_at: DateTime<Utc>,
    /// When this memory was last applied.
    pub last_used: DateTime<Utc>,
    /// How many times this memory has been applied.
    pub usage_count: u64,
    /// Exponential moving average of outcome success, in `[0, 1]`.
    pub success_rate: f64,
    /// The context this memory was captured under.
    pub context: MemoryContext,
}

/// The variant-specific payload of a memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemoryPayload {
    /// Vendor-scoped extraction knowledge.
    Vendor(VendorMemory),
    /// A learned correction rule.
    Correction(CorrectionMemory),
    /// A learned discrepancy resolution.
    Resolution(ResolutionMemory),
}

impl MemoryPayload {
    /// The [`MemoryType`] tag matching this payload's variant.
    #[must_use]
    pub fn memory_type(&self) -> MemoryType {
        match self {
            MemoryPayload::Vendor(_) => MemoryType::Vendor,
            MemoryPayload::Correction(_) => MemoryType::Correction,
            MemoryPayload::Resolution(_) => MemoryType::Resolution,
        }
    }

    /// Borrow the vendor payload, if this is a vendor memory.
    #[must_use]
    pub fn as_vendor(&self) -> Option<&VendorMemory> {
        match self {
            MemoryPayload::Vendor(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the correction payload, if this is a correction memory.
    #[must_use]
    pub fn as_correction(&self) -> Option<&CorrectionMemory> {
        match self {
            MemoryPayload::Correction(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow the resolution payload, if this is a resolution memory.
    #[must_use]
    pub fn as_resolution(&self) -> Option<&ResolutionMemory> {
        match self {
            MemoryPayload::Resolution(r) => Some(r),
            _ => None,
        }
    }
}

/// A complete memory record: envelope plus variant payload.
///
/// Memories are immutable once constructed (Design Note, spec §9): all
/// mutation happens by constructing a new `Memory` and persisting it via
/// [`crate::storage::StorageBackend::save`], never by mutating fields in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// The common envelope.
    pub envelope: MemoryEnvelope,
    /// The variant payload.
    pub payload: MemoryPayload,
}

impl Memory {
    /// Construct a new vendor memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `vendor_id` is empty, or if
    /// `context.vendor_id` is set to something other than `vendor_id`
    /// (spec §3 invariant 2: no cross-vendor contamination).
    pub fn new_vendor(
        vendor_id: impl Into<String>,
        context: MemoryContext,
        pattern: Pattern,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let vendor_id = vendor_id.into();
        if vendor_id.trim().is_empty() {
            return Err(Error::InvalidInput("vendorId must not be empty".into()));
        }
        if let Some(ctx_vendor) = &context.vendor_id {
            if ctx_vendor != &vendor_id {
                return Err(Error::InvalidInput(
                    "context.vendorId must match payload.vendorId for VendorMemory".into(),
                ));
            }
        }
        let mut context = context;
        context.vendor_id = Some(vendor_id.clone());

        Ok(Self {
            envelope: MemoryEnvelope {
                id: Uuid::new_v4(),
                memory_type: MemoryType::Vendor,
                confidence: clamp_confidence(confidence),
                pattern,
                created_at: now,
                last_used: now,
                usage_count: 0,
                success_rate: 0.0,
                context,
            },
            payload: MemoryPayload::Vendor(super::vendor::VendorMemory::new(vendor_id)),
        })
    }

    /// Construct a new correction memory.
    pub fn new_correction(
        payload: CorrectionMemory,
        context: MemoryContext,
        pattern: Pattern,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            envelope: MemoryEnvelope {
                id: Uuid::new_v4(),
                memory_type: MemoryType::Correction,
                confidence: clamp_confidence(confidence),
                pattern,
                created_at: now,
                last_used: now,
                usage_count: 0,
                success_rate: 0.0,
                context,
            },
            payload: MemoryPayload::Correction(payload),
        }
    }

    /// Construct a new resolution memory.
    pub fn new_resolution(
        payload: ResolutionMemory,
        context: MemoryContext,
        pattern: Pattern,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            envelope: MemoryEnvelope {
                id: Uuid::new_v4(),
                memory_type: MemoryType::Resolution,
                confidence: clamp_confidence(confidence),
                pattern,
                created_at: now,
                last_used: now,
                usage_count: 0,
                success_rate: 0.0,
                context,
            },
            payload: MemoryPayload::Resolution(payload),
        }
    }

    /// Validate the invariants of spec §3 that apply regardless of variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if any invariant is violated — this is
    /// a programmer-error condition that should be unreachable given the
    /// constructors above, so call sites treat a failure here as a bug.
    pub fn check_invariants(&self) -> Result<()> {
        if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&self.envelope.confidence) {
            return Err(Error::Internal(format!(
                "confidence {} out of range [{MIN_CONFIDENCE}, {MAX_CONFIDENCE}]",
                self.envelope.confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.envelope.success_rate) {
            return Err(Error::Internal(format!(
                "successRate {} out of range [0, 1]",
                self.envelope.success_rate
            )));
        }
        if self.envelope.memory_type != self.payload.memory_type() {
            return Err(Error::Internal(
                "envelope.memory_type does not match payload variant".into(),
            ));
        }
        if let MemoryPayload::Vendor(v) = &self.payload {
            if self.envelope.context.vendor_id.as_deref() != Some(v.vendor_id.as_str()) {
                return Err(Error::Internal(
                    "VendorMemory.vendor_id must equal envelope.context.vendor_id".into(),
                ));
            }
        }
        Ok(())
    }

    /// Apply an outcome to usage bookkeeping: bumps `usage_count`, sets
    /// `last_used`, and updates `success_rate` via the EMA defined in
    /// spec §3 invariant 4 (`alpha = 0.1`).
    #[must_use]
    pub fn with_usage_update(mut self, success: bool, now: DateTime<Utc>) -> Self {
        const ALPHA: f64 = 0.1;
        self.envelope.usage_count += 1;
        self.envelope.last_used = now;
        let indicator = if success { 1.0 } else { 0.0 };
        self.envelope.success_rate =
            (ALPHA * indicator + (1.0 - ALPHA) * self.envelope.success_rate).clamp(0.0, 1.0);
        self
    }

    /// Return a copy of this memory with a new confidence value, clamped
    /// into the memory-visible range.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.envelope.confidence = clamp_confidence(confidence);
        self
    }
}
