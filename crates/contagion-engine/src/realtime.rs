//! User-facing `RealtimeField` API and shutdown sequence.
//!
//! The field runs on a dedicated background thread at a configurable rate
//! (default 100 Hz) while any number of reader threads pull snapshots from
//! a ring buffer.
//!
//! # Architecture
//!
//! ```text
//! User Thread(s)                       Tick Thread
//!     |                                    |
//!     |--set_paused()/apply()/...--------->| lock(field)
//!     |   [lock(field), mark dirty]        | field.advance()
//!     |                                    | field.snapshot()
//!     |                                    | unlock
//!     |                                    | ring.push(snap)
//!     |                                    | park_timeout(budget - elapsed)
//!     |                                    |
//!     |--latest_snapshot()--> ring.latest()   (never takes the field lock)
//!     |--snapshots_since(c)-> ring.since(c)
//! ```
//!
//! One `Mutex` guards every engine mutation: ticks, restarts, parameter
//! changes and reinitialization can never interleave, so a tick never sees
//! a half-rebuilt population.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use contagion_core::{ObserverId, TickId};
use crossbeam_channel::Sender;
use tracing::{debug, info};

use crate::config::{ConfigError, FieldConfig, ParameterChange, RealtimeConfig};
use crate::field::{FieldSnapshot, SimulationField};
use crate::observer::FieldEvent;
use crate::ring::SnapshotRing;
use crate::tick_thread::TickThreadState;

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`RealtimeField::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Time spent stopping and joining the tick thread.
    pub total_ms: u64,
    /// Ticks the background thread simulated over its lifetime.
    pub ticks_advanced: u64,
    /// Whether the tick thread was joined without panicking.
    pub tick_joined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Running,
    Stopped,
}

/// Lock the shared field, recovering from poisoning.
///
/// Observers run after every mutation of a tick is complete, so a panic
/// inside one leaves the field consistent.
pub(crate) fn lock_field(field: &Mutex<SimulationField>) -> MutexGuard<'_, SimulationField> {
    field.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── RealtimeField ────────────────────────────────────────────────

/// A [`SimulationField`] stepped by a paced background thread.
pub struct RealtimeField {
    field: Arc<Mutex<SimulationField>>,
    ring: Arc<SnapshotRing>,
    shutdown_flag: Arc<AtomicBool>,
    tick_stopped: Arc<AtomicBool>,
    dirty: Arc<AtomicBool>,
    ticks_advanced: Arc<AtomicU64>,
    tick_thread: Option<JoinHandle<()>>,
    state: ShutdownState,
    config: RealtimeConfig,
}

impl RealtimeField {
    /// Build a field from `config` and start stepping it.
    pub fn new(config: FieldConfig, realtime: RealtimeConfig) -> Result<Self, ConfigError> {
        realtime.validate()?;
        let field = SimulationField::new(config)?;
        Self::from_field(field, realtime)
    }

    /// Start stepping an existing field. Its observers, flags and state
    /// are kept.
    pub fn from_field(field: SimulationField, realtime: RealtimeConfig) -> Result<Self, ConfigError> {
        realtime.validate()?;

        let ring = Arc::new(SnapshotRing::new(realtime.snapshot_ring_size));
        // Readers get a snapshot before the first tick. The tick thread
        // does not exist yet, so this is still the only producer.
        ring.push(field.snapshot());

        let seed = field.seed();
        let population = field.subjects().len();
        let field = Arc::new(Mutex::new(field));
        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let tick_stopped = Arc::new(AtomicBool::new(false));
        let dirty = Arc::new(AtomicBool::new(false));
        let ticks_advanced = Arc::new(AtomicU64::new(0));

        let state = TickThreadState::new(
            Arc::clone(&field),
            Arc::clone(&ring),
            Arc::clone(&shutdown_flag),
            Arc::clone(&tick_stopped),
            Arc::clone(&dirty),
            Arc::clone(&ticks_advanced),
            &realtime,
        );
        let tick_thread = thread::Builder::new()
            .name("contagion-tick".into())
            .spawn(move || state.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("tick thread: {e}"),
            })?;

        info!(
            tick_rate_hz = realtime.tick_rate_hz,
            population, seed, "Realtime field started"
        );

        Ok(Self {
            field,
            ring,
            shutdown_flag,
            tick_stopped,
            dirty,
            ticks_advanced,
            tick_thread: Some(tick_thread),
            state: ShutdownState::Running,
            config: realtime,
        })
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Pause or resume stepping.
    pub fn set_paused(&self, paused: bool) {
        debug!(paused, "Realtime field pause toggled");
        self.command(|f| f.set_paused(paused));
    }

    /// Reinitialize at the start of the next tick. Also resumes a paused
    /// field.
    pub fn request_restart(&self) {
        debug!("Realtime field restart requested");
        self.command(SimulationField::request_restart);
    }

    /// Enable or disable random destination assignment.
    pub fn set_destination_seeking(&self, enabled: bool) {
        self.command(|f| f.set_destination_seeking(enabled));
    }

    /// Change one option. See [`SimulationField::apply`].
    pub fn apply(&self, change: ParameterChange) -> Result<(), ConfigError> {
        self.command(|f| f.apply(change))
    }

    /// Replace the whole configuration. See [`SimulationField::reconfigure`].
    pub fn reconfigure(&self, config: FieldConfig) -> Result<(), ConfigError> {
        self.command(|f| f.reconfigure(config))
    }

    /// Rebuild the population immediately.
    pub fn initialize(&self) {
        self.command(SimulationField::initialize);
    }

    /// Register a callback. It runs on the tick thread with the field lock
    /// held, so it must not call back into this `RealtimeField`.
    pub fn subscribe<F>(&self, callback: F) -> ObserverId
    where
        F: FnMut(&FieldEvent) + Send + 'static,
    {
        lock_field(&self.field).subscribe(callback)
    }

    /// Register a channel that receives a copy of every event.
    pub fn subscribe_channel(&self, sender: Sender<FieldEvent>) -> ObserverId {
        lock_field(&self.field).subscribe_channel(sender)
    }

    /// Remove an observer.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        lock_field(&self.field).unsubscribe(id)
    }

    // ── Queries ──────────────────────────────────────────────────

    /// The most recently published snapshot. Never blocks on the engine.
    pub fn latest_snapshot(&self) -> Option<Arc<FieldSnapshot>> {
        self.ring.latest()
    }

    /// Snapshots published at or after ring position `cursor`, oldest
    /// first, and the cursor for the next call. Start from `0`.
    ///
    /// A reader that falls more than `snapshot_ring_size` snapshots behind
    /// skips the ones already overwritten. Never blocks on the engine.
    pub fn snapshots_since(&self, cursor: u64) -> (Vec<Arc<FieldSnapshot>>, u64) {
        self.ring.since(cursor)
    }

    /// Run `f` against the field with the engine lock held.
    pub fn with_field<R>(&self, f: impl FnOnce(&SimulationField) -> R) -> R {
        let field = lock_field(&self.field);
        f(&*field)
    }

    /// The next tick to be simulated.
    pub fn current_tick(&self) -> TickId {
        lock_field(&self.field).current_tick()
    }

    /// Ticks simulated by the background thread so far.
    pub fn ticks_advanced(&self) -> u64 {
        self.ticks_advanced.load(Ordering::Relaxed)
    }

    /// Whether the tick thread is still running.
    pub fn is_running(&self) -> bool {
        self.state == ShutdownState::Running && !self.tick_stopped.load(Ordering::Acquire)
    }

    /// The pacing configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    // ── Shutdown ─────────────────────────────────────────────────

    /// Stop the tick thread and join it. Idempotent.
    ///
    /// The field stays readable through [`with_field`](Self::with_field)
    /// and [`latest_snapshot`](Self::latest_snapshot) afterwards.
    pub fn shutdown(&mut self) -> ShutdownReport {
        if self.state == ShutdownState::Stopped {
            return ShutdownReport {
                total_ms: 0,
                ticks_advanced: self.ticks_advanced(),
                tick_joined: true,
            };
        }

        let start = Instant::now();
        self.shutdown_flag.store(true, Ordering::Release);

        // Wake the tick thread from its budget sleep.
        let tick_joined = match self.tick_thread.take() {
            Some(handle) => {
                handle.thread().unpark();
                handle.join().is_ok()
            }
            None => true,
        };
        self.state = ShutdownState::Stopped;

        let report = ShutdownReport {
            total_ms: start.elapsed().as_millis() as u64,
            ticks_advanced: self.ticks_advanced(),
            tick_joined,
        };
        info!(
            ticks = report.ticks_advanced,
            total_ms = report.total_ms,
            "Realtime field shut down"
        );
        report
    }

    fn command<R>(&self, f: impl FnOnce(&mut SimulationField) -> R) -> R {
        let result = {
            let mut field = lock_field(&self.field);
            f(&mut *field)
        };
        self.dirty.store(true, Ordering::Release);
        result
    }
}

impl Drop for RealtimeField {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> FieldConfig {
        FieldConfig {
            subject_count: 30,
            initial_sick: 2,
            seed: Some(42),
            ..FieldConfig::default()
        }
    }

    fn fast() -> RealtimeConfig {
        RealtimeConfig {
            tick_rate_hz: 1_000.0,
            ..RealtimeConfig::default()
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn snapshot_available_before_first_tick() {
        let rt = RealtimeField::new(
            config(),
            RealtimeConfig {
                tick_rate_hz: 1.0,
                ..RealtimeConfig::default()
            },
        )
        .unwrap();
        let snap = rt.latest_snapshot().unwrap();
        assert_eq!(snap.subjects.len(), 30);
    }

    #[test]
    fn ticks_advance_in_background() {
        let mut rt = RealtimeField::new(config(), fast()).unwrap();
        assert!(wait_for(|| rt.ticks_advanced() >= 5));
        let snap = rt.latest_snapshot().unwrap();
        assert!(snap.tick > TickId(31));
        let report = rt.shutdown();
        assert!(report.tick_joined);
        assert!(report.ticks_advanced >= 5);
        assert!(!rt.is_running());
    }

    #[test]
    fn pause_stops_ticks_and_republishes() {
        let rt = RealtimeField::new(config(), fast()).unwrap();
        assert!(wait_for(|| rt.ticks_advanced() >= 2));
        rt.set_paused(true);
        assert!(wait_for(|| rt.latest_snapshot().is_some_and(|s| s.paused)));
        let frozen = rt.current_tick();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rt.current_tick(), frozen);

        rt.set_paused(false);
        assert!(wait_for(|| rt.current_tick() > frozen));
    }

    #[test]
    fn tick_limit_pauses_at_exact_count() {
        let rt = RealtimeField::new(
            config(),
            RealtimeConfig {
                tick_limit: Some(7),
                ..fast()
            },
        )
        .unwrap();
        assert!(wait_for(|| rt.latest_snapshot().is_some_and(|s| s.paused)));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(rt.ticks_advanced(), 7);
        assert_eq!(rt.current_tick(), TickId(31 + 7));
        assert!(rt.with_field(SimulationField::is_paused));
    }

    #[test]
    fn rejected_change_reported_to_caller() {
        let rt = RealtimeField::new(config(), fast()).unwrap();
        let err = rt.apply(ParameterChange::FrictionFactor(2.0)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFriction { .. }));
        rt.apply(ParameterChange::SubjectCount(12)).unwrap();
        assert_eq!(rt.with_field(|f| f.subjects().len()), 12);
    }

    #[test]
    fn channel_observer_receives_ticks() {
        let rt = RealtimeField::new(config(), fast()).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        rt.subscribe_channel(tx);
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event, FieldEvent::TickCompleted { .. }));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut rt = RealtimeField::new(config(), fast()).unwrap();
        let first = rt.shutdown();
        assert!(first.tick_joined);
        let second = rt.shutdown();
        assert_eq!(second.total_ms, 0);
        assert_eq!(second.ticks_advanced, first.ticks_advanced);
    }

    #[test]
    fn slow_rate_still_shuts_down_promptly() {
        let mut rt = RealtimeField::new(
            config(),
            RealtimeConfig {
                tick_rate_hz: 0.1,
                ..RealtimeConfig::default()
            },
        )
        .unwrap();
        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        rt.shutdown();
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn invalid_rate_rejected() {
        let result = RealtimeField::new(
            config(),
            RealtimeConfig {
                tick_rate_hz: 0.0,
                ..RealtimeConfig::default()
            },
        );
        assert!(matches!(result, Err(ConfigError::InvalidTickRate { .. })));
    }
}
