//! Common types used across the invoice memory subsystem.

mod context;
mod correction;
mod invoice;
mod memory;
mod outcome;
mod pattern;
mod recall_context;
mod resolution;
mod vendor;

pub use context::{ComplexityLevel, InvoiceCharacteristics, MemoryContext};
pub use correction::{CorrectionAction, CorrectionMemory, CorrectionType, TriggerCondition, ValidationRule};
pub use invoice::InvoiceRef;
pub use memory::{
    clamp_confidence, Memory, MemoryEnvelope, MemoryPayload, MemoryType, MAX_CONFIDENCE,
    MIN_CONFIDENCE,
};
pub use outcome::{Outcome, SatisfactionRating};
pub use pattern::{Pattern, PatternValue};
pub use recall_context::{Environment, HistoryEntry, InvoiceContext, Priority, RelationshipType, VendorInfo};
pub use resolution::{ContextFactor, HumanDecision, ResolutionMemory};
pub use vendor::{
    CurrencyPattern, DateFormatPattern, FieldMapping, MappingExample, TransformationRule,
    VatBehavior, VendorMemory, MAX_EXAMPLES_PER_MAPPING,
};
