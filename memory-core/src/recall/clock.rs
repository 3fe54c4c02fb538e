//! The wall-clock collaborator the recall engine samples exactly once
//! per call (spec §4.3 Determinism).

use chrono::{DateTime, Utc};

/// Supplies the current time. Injected so ranking math never reads the
/// wall clock directly — identical inputs must yield byte-identical
/// outputs (spec §4.3).
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// The production [`Clock`], backed by the real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A [`Clock`] that always returns the same instant. Used by tests that
/// need deterministic recency scoring.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
