//! The three-state contagion model.
//!
//! ```text
//! Susceptible ──(transmission)──> Infected ──(duration elapsed)──> Removed
//! ```
//!
//! `Removed` is absorbing: no transition leaves it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Health status of a subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Can be infected by a nearby infected subject.
    Susceptible,
    /// Spreads the infection until its scheduled change tick.
    Infected,
    /// Recovered or otherwise out of the model. Terminal.
    Removed,
}

impl HealthStatus {
    /// All statuses in ordinal order.
    pub const ALL: [HealthStatus; 3] = [
        HealthStatus::Susceptible,
        HealthStatus::Infected,
        HealthStatus::Removed,
    ];

    /// Ordinal position, used to index per-status tables.
    pub fn index(self) -> usize {
        match self {
            HealthStatus::Susceptible => 0,
            HealthStatus::Infected => 1,
            HealthStatus::Removed => 2,
        }
    }

    /// Whether the model allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: HealthStatus) -> bool {
        matches!(
            (self, next),
            (HealthStatus::Susceptible, HealthStatus::Infected)
                | (HealthStatus::Infected, HealthStatus::Removed)
        )
    }

    /// Whether no transition leaves this status.
    pub fn is_terminal(self) -> bool {
        self == HealthStatus::Removed
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthStatus::Susceptible => "susceptible",
            HealthStatus::Infected => "infected",
            HealthStatus::Removed => "removed",
        };
        f.write_str(name)
    }
}

/// Number of subjects in each [`HealthStatus`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Subjects currently susceptible.
    pub susceptible: u32,
    /// Subjects currently infected.
    pub infected: u32,
    /// Subjects removed from the model.
    pub removed: u32,
}

impl StatusCounts {
    /// Tally a sequence of statuses.
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        let mut counts = Self::default();
        for status in statuses {
            counts.increment(status);
        }
        counts
    }

    /// Count for one status.
    pub fn get(&self, status: HealthStatus) -> u32 {
        match status {
            HealthStatus::Susceptible => self.susceptible,
            HealthStatus::Infected => self.infected,
            HealthStatus::Removed => self.removed,
        }
    }

    /// Add one subject with `status`.
    pub fn increment(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Susceptible => self.susceptible += 1,
            HealthStatus::Infected => self.infected += 1,
            HealthStatus::Removed => self.removed += 1,
        }
    }

    /// Population size these counts cover.
    pub fn total(&self) -> u32 {
        self.susceptible + self.infected + self.removed
    }

    /// Counts as an array in [`HealthStatus::ALL`] order.
    pub fn as_array(&self) -> [u32; 3] {
        [self.susceptible, self.infected, self.removed]
    }
}
