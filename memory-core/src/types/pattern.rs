//! The opaque, free-form pattern carried by every memory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scalar value inside `Pattern::pattern_data`.
///
/// Kept as a small closed enum rather than raw `serde_json::Value` so
/// equality and hashing stay simple while remaining free-form at the
/// call site — callers outside pattern mining should treat this as
/// opaque, per the specification's pattern-data opacity note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternValue {
    /// Free text.
    Text(String),
    /// A numeric measurement or count.
    Number(f64),
    /// A boolean flag.
    Bool(bool),
}

impl PatternValue {
    /// Returns the inner string if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PatternValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner number if this is a `Number` value.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PatternValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// The structural pattern a memory was recognized from or matches against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// A short tag naming the kind of pattern (e.g. `"field_mapping"`,
    /// `"vat_behavior"`, `"date_format"`).
    pub pattern_type: String,
    /// Opaque, free-form pattern data.
    pub pattern_data: HashMap<String, PatternValue>,
    /// Minimum match quality, in `[0, 1]`, required for this pattern to
    /// be considered a hit.
    pub threshold: f64,
}

impl Pattern {
    /// Construct a new pattern with an empty data map.
    #[must_use]
    pub fn new(pattern_type: impl Into<String>, threshold: f64) -> Self {
        Self {
            pattern_type: pattern_type.into(),
            pattern_data: HashMap::new(),
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Insert a key/value pair into the pattern data, builder-style.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: PatternValue) -> Self {
        self.pattern_data.insert(key.into(), value);
        self
    }
}
