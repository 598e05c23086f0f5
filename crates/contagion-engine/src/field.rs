//! The lockstep simulation field.
//!
//! [`SimulationField`] owns the population, the RNG, the statistics and
//! the observer set. It is passive: nothing happens until a driver calls
//! [`advance()`](SimulationField::advance). Every mutating method takes
//! `&mut self`, so exclusive access is enforced by the borrow checker; a
//! multi-threaded driver wraps the field in a single `Mutex` (see
//! [`RealtimeField`](crate::RealtimeField)).
//!
//! # Tick order
//!
//! 1. A pending restart reinitializes the population and clears pause.
//! 2. A paused field returns [`TickOutcome::Paused`] without mutating
//!    anything.
//! 3. Destination assignment (when seeking is enabled), subject physics
//!    and status timeouts, the transmission pass, statistics.
//! 4. The tick index is incremented.
//! 5. Observers receive [`FieldEvent::TickCompleted`].

use std::time::Instant;

use contagion_core::{HealthStatus, ObserverId, StatusCounts, SubjectId, TickId, Vec2};
use crossbeam_channel::Sender;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigError, FieldConfig, ParameterChange};
use crate::metrics::StepMetrics;
use crate::observer::{FieldEvent, Observers};
use crate::stats::TimeSeries;
use crate::subject::{random_vector, MotionParams, Subject, MAX_RANDOM_FORCE};
use crate::transmission::{self, Infections, TransmissionParams};

// ── Public types ───────────────────────────────────────────────────

/// Whether the field steps when advanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// `advance()` steps the simulation.
    Running,
    /// `advance()` is a no-op until unpaused or restarted.
    Paused,
}

/// Result of one [`SimulationField::advance`] call.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// The field is paused; nothing changed.
    Paused,
    /// One tick was simulated.
    Advanced(TickReport),
}

impl TickOutcome {
    /// The report, if a tick was simulated.
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            Self::Paused => None,
            Self::Advanced(report) => Some(report),
        }
    }
}

/// What happened during one simulated tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// The tick that was simulated.
    pub tick: TickId,
    /// Population counts after the tick.
    pub counts: StatusCounts,
    /// Subjects infected by the transmission pass, in infection order.
    pub infected: Infections,
    /// Subjects whose infection ended this tick.
    pub removals: u32,
    /// Subject sent to the destination this tick, if any.
    pub destination_assigned: Option<SubjectId>,
    /// Whether this tick was the first with zero infected.
    pub eradicated: bool,
}

/// Render-facing view of one subject.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubjectView {
    /// Population index.
    pub id: SubjectId,
    /// Location at the time of the snapshot.
    pub position: Vec2,
    /// Health status at the time of the snapshot.
    pub status: HealthStatus,
    /// Tick the current status began.
    pub event_tick: TickId,
}

impl SubjectView {
    /// Ticks since the current status began, as seen at `tick`.
    pub fn phase(&self, tick: TickId) -> u64 {
        tick.since(self.event_tick)
    }
}

/// Owned copy of the render-relevant field state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// Tick index at the time of the snapshot (the next tick to simulate).
    pub tick: TickId,
    /// One view per subject, in population order.
    pub subjects: Vec<SubjectView>,
    /// Current per-status counts.
    pub counts: StatusCounts,
    /// Highest infected count recorded this run.
    pub max_infected: u32,
    /// First tick with zero infected, if reached.
    pub eradication_tick: Option<TickId>,
    /// Whether the field was paused.
    pub paused: bool,
}

// ── SimulationField ────────────────────────────────────────────────

/// The simulation engine.
pub struct SimulationField {
    config: FieldConfig,
    subjects: Vec<Subject>,
    rng: ChaCha8Rng,
    seed: u64,
    tick: TickId,
    stats: TimeSeries,
    paused: bool,
    restart_requested: bool,
    destination_seeking: bool,
    observers: Observers,
    last_metrics: StepMetrics,
}

impl std::fmt::Debug for SimulationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationField")
            .field("tick", &self.tick)
            .field("subjects", &self.subjects.len())
            .field("seed", &self.seed)
            .field("paused", &self.paused)
            .field("destination_seeking", &self.destination_seeking)
            .field("eradication_tick", &self.stats.eradication_tick())
            .finish_non_exhaustive()
    }
}

impl SimulationField {
    /// Validate `config` and build an initialized field.
    pub fn new(config: FieldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut field = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            subjects: Vec::with_capacity(config.subject_count),
            config,
            tick: TickId(0),
            stats: TimeSeries::new(),
            paused: false,
            restart_requested: false,
            destination_seeking: false,
            observers: Observers::new(),
            last_metrics: StepMetrics::default(),
        };
        field.populate();
        Ok(field)
    }

    // ── Commands ───────────────────────────────────────────────────

    /// Rebuild the population and reset tick, statistics and eradication.
    ///
    /// Observers receive `ConfigurationChanged { reinitialized: true }`.
    pub fn initialize(&mut self) {
        self.populate();
        self.observers.notify(&FieldEvent::ConfigurationChanged {
            reinitialized: true,
        });
    }

    /// Change one option.
    ///
    /// The change is validated against a copy of the configuration first;
    /// on error the field is left untouched. Population size, initial sick
    /// count and infection radius reinitialize the field, every other
    /// option is picked up on the next tick.
    pub fn apply(&mut self, change: ParameterChange) -> Result<(), ConfigError> {
        let mut candidate = self.config.clone();
        change.apply_to(&mut candidate);
        if let Err(err) = candidate.validate() {
            warn!(option = change.name(), error = %err, "Rejected configuration change");
            return Err(err);
        }
        self.config = candidate;
        let reinitialized = change.requires_reinitialize();
        if reinitialized {
            self.populate();
        } else if let ParameterChange::Bounds(bounds) = &change {
            // Removed subjects never move again, so they are confined here.
            for subject in &mut self.subjects {
                subject.confine(bounds);
            }
        }
        debug!(option = change.name(), reinitialized, "Configuration changed");
        self.observers
            .notify(&FieldEvent::ConfigurationChanged { reinitialized });
        Ok(())
    }

    /// Replace the whole configuration and reinitialize.
    ///
    /// The RNG is reseeded from `config.seed` (or a fresh seed when
    /// `None`). Observers and the pause/seeking flags are kept.
    pub fn reconfigure(&mut self, config: FieldConfig) -> Result<(), ConfigError> {
        if let Err(err) = config.validate() {
            warn!(error = %err, "Rejected configuration");
            return Err(err);
        }
        self.seed = config.seed.unwrap_or_else(rand::random);
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.config = config;
        self.initialize();
        Ok(())
    }

    /// Pause or resume stepping.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Reinitialize at the start of the next [`advance()`](Self::advance).
    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    /// Enable or disable random destination assignment.
    pub fn set_destination_seeking(&mut self, enabled: bool) {
        self.destination_seeking = enabled;
    }

    /// Run one tick. See the [module docs](self) for the exact order.
    pub fn advance(&mut self) -> TickOutcome {
        if self.restart_requested {
            self.restart_requested = false;
            self.paused = false;
            self.populate();
            self.observers.notify(&FieldEvent::ConfigurationChanged {
                reinitialized: true,
            });
        }
        if self.paused {
            return TickOutcome::Paused;
        }

        let tick_start = Instant::now();
        let tick = self.tick;

        // 1. Destination assignment and movement.
        let destination_assigned = if self.destination_seeking {
            self.assign_destination(tick)
        } else {
            None
        };
        let motion = MotionParams {
            mass: self.config.subject_mass,
            friction: self.config.friction_factor,
            bounds: self.config.bounds,
        };
        let mut removals = 0;
        for subject in &mut self.subjects {
            if subject.status().is_terminal() {
                continue;
            }
            let force = random_vector(&mut self.rng, MAX_RANDOM_FORCE);
            if subject.update(&motion, force, tick) {
                removals += 1;
            }
        }
        let movement_done = Instant::now();

        // 2. Transmission.
        let params = TransmissionParams {
            radius_squared: self.config.infection_radius_squared(),
            probability: self.config.transmission_probability(),
            duration: self.config.infection_duration(),
        };
        let infected = transmission::spread(&mut self.subjects, &params, tick, &mut self.rng);
        let transmission_done = Instant::now();

        // 3. Statistics. Recording stops once eradicated.
        let counts = self.counts();
        let eradicated = self.stats.record(tick, counts);
        if eradicated {
            info!(
                tick = tick.0,
                max_infected = self.stats.max_infected(),
                "Infection eradicated"
            );
        }
        trace!(
            tick = tick.0,
            susceptible = counts.susceptible,
            infected = counts.infected,
            removed = counts.removed,
            "Tick completed"
        );
        let statistics_done = Instant::now();

        // 4. Commit, then notify.
        self.tick = tick.next();
        self.observers
            .notify(&FieldEvent::TickCompleted { tick, counts });
        let notify_done = Instant::now();

        self.last_metrics = StepMetrics {
            total_us: micros(notify_done - tick_start),
            movement_us: micros(movement_done - tick_start),
            transmission_us: micros(transmission_done - movement_done),
            statistics_us: micros(statistics_done - transmission_done),
            notify_us: micros(notify_done - statistics_done),
            infections: infected.len() as u32,
            removals,
            destination_assigned: destination_assigned.is_some(),
        };

        TickOutcome::Advanced(TickReport {
            tick,
            counts,
            infected,
            removals,
            destination_assigned,
            eradicated,
        })
    }

    // ── Observers ──────────────────────────────────────────────────

    /// Register a callback run synchronously after each tick and each
    /// configuration change.
    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&FieldEvent) + Send + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Register a channel that receives a copy of every event.
    pub fn subscribe_channel(&mut self, sender: Sender<FieldEvent>) -> ObserverId {
        self.observers.subscribe_channel(sender)
    }

    /// Remove an observer. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ── Queries ────────────────────────────────────────────────────

    /// The next tick to be simulated.
    pub fn current_tick(&self) -> TickId {
        self.tick
    }

    /// The population, in index order.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// One subject by ID.
    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(id.index())
    }

    /// Mutable access to one subject, for scripted scenarios.
    pub fn subject_mut(&mut self, id: SubjectId) -> Option<&mut Subject> {
        self.subjects.get_mut(id.index())
    }

    /// Current per-status counts.
    pub fn counts(&self) -> StatusCounts {
        StatusCounts::tally(self.subjects.iter().map(Subject::status))
    }

    /// Owned render-facing copy of the current state.
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            tick: self.tick,
            subjects: self
                .subjects
                .iter()
                .enumerate()
                .map(|(i, s)| SubjectView {
                    id: SubjectId(i as u32),
                    position: s.position(),
                    status: s.status(),
                    event_tick: s.event_tick(),
                })
                .collect(),
            counts: self.counts(),
            max_infected: self.stats.max_infected(),
            eradication_tick: self.stats.eradication_tick(),
            paused: self.paused,
        }
    }

    /// Per-tick counts recorded this run.
    pub fn time_series(&self) -> &TimeSeries {
        &self.stats
    }

    /// Highest infected count recorded this run.
    pub fn max_infected(&self) -> u32 {
        self.stats.max_infected()
    }

    /// First tick with zero infected, if reached.
    pub fn eradication_tick(&self) -> Option<TickId> {
        self.stats.eradication_tick()
    }

    /// Running or paused.
    pub fn state(&self) -> EngineState {
        if self.paused {
            EngineState::Paused
        } else {
            EngineState::Running
        }
    }

    /// Whether stepping is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a restart is pending.
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Whether random destination assignment is enabled.
    pub fn destination_seeking(&self) -> bool {
        self.destination_seeking
    }

    /// Seed the RNG was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Active configuration.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Metrics from the most recent simulated tick.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Events lost to full bounded observer channels.
    pub fn dropped_notifications(&self) -> u64 {
        self.observers.dropped_events()
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Recreate every subject. Subject `i` is created at tick `i`; the
    /// first `initial_sick` are infected at their creation tick. The first
    /// simulated tick is `subject_count + 1`.
    fn populate(&mut self) {
        let count = self.config.subject_count;
        let bounds = self.config.bounds;
        let duration = self.config.infection_duration();

        self.subjects.clear();
        for i in 0..count {
            let created = TickId(i as u64);
            let mut subject = Subject::random(&mut self.rng, &bounds, created);
            if i < self.config.initial_sick {
                subject.infect(created, duration.sample(&mut self.rng));
            }
            self.subjects.push(subject);
        }
        self.tick = TickId(count as u64 + 1);
        self.stats.clear();
        self.last_metrics = StepMetrics::default();

        debug!(
            population = count,
            initial_sick = self.config.initial_sick,
            seed = self.seed,
            "Field initialized"
        );
    }

    fn assign_destination(&mut self, tick: TickId) -> Option<SubjectId> {
        if self.subjects.is_empty() || self.rng.random::<f64>() >= self.config.odds_of_destination
        {
            return None;
        }
        let index = self.rng.random_range(0..self.subjects.len());
        let stay = self.config.stay_duration().sample(&mut self.rng);
        self.subjects[index].assign_destination(self.config.destination, tick.offset(stay));
        Some(SubjectId(index as u32))
    }
}

fn micros(d: std::time::Duration) -> u64 {
    d.as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_core::Bounds;
    use std::sync::{Arc, Mutex};

    fn small(seed: u64) -> FieldConfig {
        FieldConfig {
            subject_count: 20,
            initial_sick: 3,
            seed: Some(seed),
            ..FieldConfig::default()
        }
    }

    #[test]
    fn initialize_infects_exactly_initial_sick() {
        let field = SimulationField::new(small(1)).unwrap();
        let counts = field.counts();
        assert_eq!(counts.infected, 3);
        assert_eq!(counts.susceptible, 17);
        assert_eq!(counts.removed, 0);
        for (i, s) in field.subjects().iter().enumerate() {
            let expected = if i < 3 {
                HealthStatus::Infected
            } else {
                HealthStatus::Susceptible
            };
            assert_eq!(s.status(), expected);
        }
    }

    #[test]
    fn creation_ticks_are_staggered() {
        let field = SimulationField::new(small(2)).unwrap();
        assert_eq!(field.current_tick(), TickId(21));
        for (i, s) in field.subjects().iter().enumerate() {
            assert_eq!(s.event_tick(), TickId(i as u64));
            assert!(field.config().bounds.contains(s.position()));
        }
        let sick = &field.subjects()[1];
        let change = sick.change_tick().unwrap();
        assert!(change >= TickId(1 + 7 * 72) && change < TickId(1 + 21 * 72));
    }

    #[test]
    fn invalid_config_rejected_at_construction() {
        let cfg = FieldConfig {
            friction_factor: 1.0,
            ..FieldConfig::default()
        };
        assert!(matches!(
            SimulationField::new(cfg),
            Err(ConfigError::InvalidFriction { .. })
        ));
    }

    #[test]
    fn advance_increments_tick_and_records_sample() {
        let mut field = SimulationField::new(small(3)).unwrap();
        let start = field.current_tick();
        let report = match field.advance() {
            TickOutcome::Advanced(r) => r,
            TickOutcome::Paused => panic!("field should not be paused"),
        };
        assert_eq!(report.tick, start);
        assert_eq!(field.current_tick(), start.next());
        assert_eq!(field.time_series().len(), 1);
        assert_eq!(field.time_series().samples()[0].tick, start);
        assert_eq!(report.counts.total(), 20);
    }

    #[test]
    fn paused_advance_changes_nothing() {
        let mut field = SimulationField::new(small(4)).unwrap();
        field.advance();
        field.set_paused(true);
        assert_eq!(field.state(), EngineState::Paused);
        let before = field.snapshot();
        let subjects: Vec<Subject> = field.subjects().to_vec();
        assert_eq!(field.advance(), TickOutcome::Paused);
        assert_eq!(field.snapshot(), before);
        assert_eq!(field.subjects(), subjects.as_slice());
        assert_eq!(field.time_series().len(), 1);
    }

    #[test]
    fn restart_resets_and_unpauses() {
        let mut field = SimulationField::new(small(5)).unwrap();
        let initial_tick = field.current_tick();
        for _ in 0..10 {
            field.advance();
        }
        field.set_paused(true);
        field.request_restart();
        assert!(field.restart_requested());

        let report = field.advance();
        assert!(!field.restart_requested());
        assert!(!field.is_paused());
        // The restart happened first, then one tick ran from the fresh state.
        assert_eq!(report.report().map(|r| r.tick), Some(initial_tick));
        assert_eq!(field.current_tick(), initial_tick.next());
        assert_eq!(field.time_series().len(), 1);
    }

    #[test]
    fn zero_initial_sick_eradicates_on_first_tick() {
        let cfg = FieldConfig {
            initial_sick: 0,
            ..small(6)
        };
        let mut field = SimulationField::new(cfg).unwrap();
        let tick = field.current_tick();
        let report = field.advance().report().cloned().unwrap();
        assert!(report.eradicated);
        assert_eq!(field.eradication_tick(), Some(tick));
        field.advance();
        assert_eq!(field.eradication_tick(), Some(tick));
        assert_eq!(field.time_series().len(), 1);
    }

    #[test]
    fn rejected_change_leaves_state_untouched() {
        let mut field = SimulationField::new(small(7)).unwrap();
        field.advance();
        let before = field.snapshot();
        let config = field.config().clone();
        let err = field.apply(ParameterChange::InitialSick(20)).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyInitialSick { .. }));
        assert_eq!(field.config(), &config);
        assert_eq!(field.snapshot(), before);
    }

    #[test]
    fn reinitializing_change_rebuilds_population() {
        let mut field = SimulationField::new(small(8)).unwrap();
        for _ in 0..5 {
            field.advance();
        }
        field.apply(ParameterChange::SubjectCount(40)).unwrap();
        assert_eq!(field.subjects().len(), 40);
        assert_eq!(field.current_tick(), TickId(41));
        assert!(field.time_series().is_empty());
        assert_eq!(field.counts().infected, 3);
    }

    #[test]
    fn plain_change_keeps_population() {
        let mut field = SimulationField::new(small(9)).unwrap();
        field.advance();
        let tick = field.current_tick();
        field.apply(ParameterChange::SubjectMass(20.0)).unwrap();
        assert_eq!(field.current_tick(), tick);
        assert_eq!(field.config().subject_mass, 20.0);
        assert_eq!(field.time_series().len(), 1);
    }

    #[test]
    fn observers_see_ticks_and_changes() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut field = SimulationField::new(small(10)).unwrap();
        let log = Arc::clone(&events);
        field.subscribe(move |e| log.lock().unwrap().push(*e));

        let tick = field.current_tick();
        field.advance();
        field.apply(ParameterChange::OddsOfInfection(0.5)).unwrap();
        field.apply(ParameterChange::InfectionRadius(10.0)).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], FieldEvent::TickCompleted { tick: t, .. } if t == tick));
        assert_eq!(
            events[1],
            FieldEvent::ConfigurationChanged {
                reinitialized: false
            }
        );
        assert_eq!(
            events[2],
            FieldEvent::ConfigurationChanged {
                reinitialized: true
            }
        );
    }

    #[test]
    fn paused_advance_does_not_notify() {
        let hits = Arc::new(Mutex::new(0u32));
        let mut field = SimulationField::new(small(11)).unwrap();
        let counter = Arc::clone(&hits);
        field.subscribe(move |_| *counter.lock().unwrap() += 1);
        field.set_paused(true);
        field.advance();
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = SimulationField::new(small(12)).unwrap();
        let mut b = SimulationField::new(small(12)).unwrap();
        a.set_destination_seeking(true);
        b.set_destination_seeking(true);
        for _ in 0..50 {
            assert_eq!(a.advance(), b.advance());
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn certain_destination_assignment() {
        let cfg = FieldConfig {
            odds_of_destination: 1.0,
            min_stay_time: 10,
            max_stay_time: 10,
            ..small(13)
        };
        let mut field = SimulationField::new(cfg).unwrap();
        field.set_destination_seeking(true);
        let tick = field.current_tick();
        let report = field.advance().report().cloned().unwrap();
        let id = report.destination_assigned.unwrap();
        let subject = field.subject(id).unwrap();
        if subject.status() != HealthStatus::Removed {
            assert_eq!(subject.return_tick(), Some(tick.offset(10)));
            assert_eq!(subject.destination(), Some(field.config().destination));
        }
        assert!(field.last_metrics().destination_assigned);
    }

    #[test]
    fn seeking_disabled_assigns_nothing() {
        let cfg = FieldConfig {
            odds_of_destination: 1.0,
            ..small(14)
        };
        let mut field = SimulationField::new(cfg).unwrap();
        for _ in 0..20 {
            let report = field.advance().report().cloned().unwrap();
            assert_eq!(report.destination_assigned, None);
        }
        assert!(field.subjects().iter().all(|s| s.destination().is_none()));
    }

    #[test]
    fn snapshot_mirrors_subjects() {
        let field = SimulationField::new(small(15)).unwrap();
        let snap = field.snapshot();
        assert_eq!(snap.tick, field.current_tick());
        assert_eq!(snap.subjects.len(), 20);
        assert_eq!(snap.counts, field.counts());
        assert!(!snap.paused);
        for (view, subject) in snap.subjects.iter().zip(field.subjects()) {
            assert_eq!(view.position, subject.position());
            assert_eq!(view.status, subject.status());
        }
        assert_eq!(snap.subjects[4].phase(snap.tick), 21 - 4);
    }

    #[test]
    fn reconfigure_reseeds_and_reinitializes() {
        let mut field = SimulationField::new(small(16)).unwrap();
        field.advance();
        field
            .reconfigure(FieldConfig {
                subject_count: 5,
                initial_sick: 1,
                seed: Some(99),
                ..FieldConfig::default()
            })
            .unwrap();
        assert_eq!(field.seed(), 99);
        assert_eq!(field.subjects().len(), 5);
        assert_eq!(field.current_tick(), TickId(6));

        let fresh = SimulationField::new(field.config().clone()).unwrap();
        assert_eq!(fresh.snapshot(), field.snapshot());
    }

    #[test]
    fn full_observer_channel_counts_dropped_events() {
        let mut field = SimulationField::new(small(19)).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(2);
        field.subscribe_channel(tx);
        for _ in 0..5 {
            field.advance();
        }
        assert_eq!(field.dropped_notifications(), 3);
        assert_eq!(rx.try_iter().count(), 2);
        field.advance();
        assert_eq!(field.dropped_notifications(), 3);
    }

    #[test]
    fn shrinking_bounds_confines_removed_subjects() {
        let cfg = FieldConfig {
            subject_count: 50,
            initial_sick: 10,
            odds_of_infection: 0.0,
            time_scale: 1,
            min_infection_time: 1,
            max_infection_time: 1,
            seed: Some(18),
            ..FieldConfig::default()
        };
        let mut field = SimulationField::new(cfg).unwrap();
        field.advance();
        assert_eq!(field.counts().removed, 10);

        let small = Bounds::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        field.apply(ParameterChange::Bounds(small)).unwrap();
        assert!(field.subjects().iter().all(|s| small.contains(s.position())));

        let removed: Vec<_> = field
            .subjects()
            .iter()
            .filter(|s| s.status() == HealthStatus::Removed)
            .map(|s| s.position())
            .collect();
        for _ in 0..5 {
            field.advance();
            assert!(field.subjects().iter().all(|s| small.contains(s.position())));
        }
        let still: Vec<_> = field
            .subjects()
            .iter()
            .filter(|s| s.status() == HealthStatus::Removed)
            .map(|s| s.position())
            .collect();
        assert_eq!(still, removed);
    }

    #[test]
    fn metrics_count_infections() {
        let cfg = FieldConfig {
            subject_count: 10,
            initial_sick: 1,
            infection_radius: 1_000.0,
            odds_of_infection: 1.0,
            time_scale: 1,
            min_infection_time: 50,
            max_infection_time: 60,
            seed: Some(17),
            ..FieldConfig::default()
        };
        let mut field = SimulationField::new(cfg).unwrap();
        let report = field.advance().report().cloned().unwrap();
        assert_eq!(report.infected.len(), 9);
        assert_eq!(field.last_metrics().infections, 9);
        assert_eq!(field.last_metrics().removals, 0);
    }
}
