//! Error taxonomy for the invoice memory subsystem.

/// Result type alias for memory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the invoice memory subsystem.
///
/// `PatternInsufficient` from the specification's error taxonomy is
/// deliberately absent here: per design, insufficient-pattern conditions
/// surface as an empty result (`None`/`Vec::new()`), not as an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any failure reported by the storage collaborator.
    #[error("storage error: {0}")]
    Storage(String),

    /// Missing/empty `vendorId`, `id`, `invoiceNumber`, or a confidence
    /// value outside `[0.1, 1.0]`.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A memory record could not be found by id.
    #[error("memory not found: {0}")]
    NotFound(uuid::Uuid),

    /// Variant payload missing on deserialization, or any other
    /// programmer-error condition that should be unreachable.
    #[error("internal error: {0}")]
    Internal(String),

    /// JSON (de)serialization failure, e.g. from state snapshot round-trips.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error represents a transient condition a caller may
    /// retry, as opposed to a structural/programmer error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}
