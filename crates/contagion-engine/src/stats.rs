//! Per-tick population statistics and eradication detection.

use contagion_core::{StatusCounts, TickId};
use serde::{Deserialize, Serialize};

/// Per-status counts recorded at one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSample {
    /// Tick the counts were taken at.
    pub tick: TickId,
    /// Subjects in each status.
    pub counts: StatusCounts,
}

/// Append-only history of [`StatusSample`]s for one run.
///
/// Recording stops once eradication is detected: the first sample with
/// zero infected fixes [`eradication_tick`](Self::eradication_tick) for
/// the rest of the run and later [`record`](Self::record) calls are
/// ignored. `Removed` is terminal and nothing reintroduces the infection,
/// so nothing is lost.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    samples: Vec<StatusSample>,
    max_infected: u32,
    eradication_tick: Option<TickId>,
}

impl TimeSeries {
    /// An empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the counts for `tick`.
    ///
    /// Returns `true` if this sample detected eradication. No-op after
    /// eradication.
    pub fn record(&mut self, tick: TickId, counts: StatusCounts) -> bool {
        if self.is_eradicated() {
            return false;
        }
        self.samples.push(StatusSample { tick, counts });
        self.max_infected = self.max_infected.max(counts.infected);
        if counts.infected == 0 {
            self.eradication_tick = Some(tick);
            return true;
        }
        false
    }

    /// Forget every sample and the eradication tick.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.max_infected = 0;
        self.eradication_tick = None;
    }

    /// Recorded samples, oldest first.
    pub fn samples(&self) -> &[StatusSample] {
        &self.samples
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&StatusSample> {
        self.samples.last()
    }

    /// Highest infected count seen so far.
    pub fn max_infected(&self) -> u32 {
        self.max_infected
    }

    /// First tick with zero infected, if reached.
    pub fn eradication_tick(&self) -> Option<TickId> {
        self.eradication_tick
    }

    /// Whether eradication has been detected.
    pub fn is_eradicated(&self) -> bool {
        self.eradication_tick.is_some()
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(s: u32, i: u32, r: u32) -> StatusCounts {
        StatusCounts {
            susceptible: s,
            infected: i,
            removed: r,
        }
    }

    #[test]
    fn tracks_max_infected() {
        let mut ts = TimeSeries::new();
        ts.record(TickId(1), counts(8, 2, 0));
        ts.record(TickId(2), counts(5, 5, 0));
        ts.record(TickId(3), counts(5, 3, 2));
        assert_eq!(ts.max_infected(), 5);
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.latest().map(|s| s.tick), Some(TickId(3)));
    }

    #[test]
    fn eradication_is_recorded_once() {
        let mut ts = TimeSeries::new();
        assert!(!ts.record(TickId(1), counts(9, 1, 0)));
        assert!(ts.record(TickId(2), counts(9, 0, 1)));
        assert_eq!(ts.eradication_tick(), Some(TickId(2)));

        assert!(!ts.record(TickId(3), counts(9, 0, 1)));
        assert_eq!(ts.eradication_tick(), Some(TickId(2)));
        assert_eq!(ts.len(), 2, "recording stops after eradication");
    }

    #[test]
    fn clear_resets_everything() {
        let mut ts = TimeSeries::new();
        ts.record(TickId(1), counts(0, 0, 3));
        ts.clear();
        assert!(ts.is_empty());
        assert_eq!(ts.max_infected(), 0);
        assert_eq!(ts.eradication_tick(), None);
    }
}
