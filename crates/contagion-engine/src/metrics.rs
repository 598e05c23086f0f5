//! Per-tick performance metrics for the simulation field.
//!
//! [`StepMetrics`] captures phase timings and event counts for a single
//! tick, for telemetry and profiling.

/// Timing and event counts collected during a single tick.
///
/// All durations are in microseconds. The field fills these in on every
/// [`advance()`](crate::SimulationField::advance) that actually steps;
/// paused ticks leave the previous values in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire tick, in microseconds.
    pub total_us: u64,
    /// Time spent on destination assignment and subject updates, in microseconds.
    pub movement_us: u64,
    /// Time spent in the transmission pass, in microseconds.
    pub transmission_us: u64,
    /// Time spent counting statuses and recording the time series, in microseconds.
    pub statistics_us: u64,
    /// Time spent delivering the tick notification to observers, in microseconds.
    pub notify_us: u64,
    /// Subjects infected during this tick.
    pub infections: u32,
    /// Subjects removed during this tick.
    pub removals: u32,
    /// Whether a subject was sent to the destination this tick.
    pub destination_assigned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.movement_us, 0);
        assert_eq!(m.transmission_us, 0);
        assert_eq!(m.statistics_us, 0);
        assert_eq!(m.notify_us, 0);
        assert_eq!(m.infections, 0);
        assert_eq!(m.removals, 0);
        assert!(!m.destination_assigned);
    }
}
