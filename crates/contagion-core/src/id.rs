//! Strongly-typed identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonically increasing tick counter.
///
/// Incremented each time the field advances one step. After
/// initialization the first simulated tick is `subject_count + 1`
/// (creation ticks `0..subject_count` are used to stagger subjects).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickId(pub u64);

impl TickId {
    /// The tick immediately after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// This tick shifted forward by `ticks`.
    pub fn offset(self, ticks: u64) -> Self {
        Self(self.0.saturating_add(ticks))
    }

    /// Ticks elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: TickId) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of a subject within the population.
///
/// Stable for the lifetime of one initialization; reinitializing the
/// field rebuilds the population and reuses IDs `0..subject_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub u32);

impl SubjectId {
    /// The population index this ID refers to.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SubjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Handle returned when an observer subscribes to a field.
///
/// Allocated per field instance; pass it back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
