//! Paced tick loop for [`RealtimeField`](crate::RealtimeField).
//!
//! Each iteration locks the shared field, advances it, takes a snapshot
//! and releases the lock before publishing to the ring, so readers of the
//! ring never wait on the engine. The tick thread is the only producer of
//! the ring; commands issued while paused mark the field dirty and the
//! next iteration republishes it. The remaining tick budget is spent in
//! `park_timeout`, which `unpark()` cuts short on shutdown. With a tick
//! limit, the tick that reaches it also pauses the field under the same
//! lock, so no further tick can slip in.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::RealtimeConfig;
use crate::field::{SimulationField, TickOutcome};
use crate::realtime::lock_field;
use crate::ring::SnapshotRing;

/// State moved into the tick thread.
pub(crate) struct TickThreadState {
    field: Arc<Mutex<SimulationField>>,
    ring: Arc<SnapshotRing>,
    shutdown_flag: Arc<AtomicBool>,
    tick_stopped: Arc<AtomicBool>,
    dirty: Arc<AtomicBool>,
    ticks_advanced: Arc<AtomicU64>,
    tick_budget: Duration,
    tick_limit: Option<u64>,
}

impl TickThreadState {
    pub fn new(
        field: Arc<Mutex<SimulationField>>,
        ring: Arc<SnapshotRing>,
        shutdown_flag: Arc<AtomicBool>,
        tick_stopped: Arc<AtomicBool>,
        dirty: Arc<AtomicBool>,
        ticks_advanced: Arc<AtomicU64>,
        realtime: &RealtimeConfig,
    ) -> Self {
        Self {
            field,
            ring,
            shutdown_flag,
            tick_stopped,
            dirty,
            ticks_advanced,
            tick_budget: realtime.tick_budget(),
            tick_limit: realtime.tick_limit,
        }
    }

    /// Main loop. Runs until `shutdown_flag` is set.
    pub fn run(self) {
        debug!(budget_us = self.tick_budget.as_micros() as u64, "Tick thread started");
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            let tick_start = Instant::now();

            // 1. Advance and copy out under the lock. A paused field is
            //    only republished after a command changed it.
            let snapshot = {
                let mut field = lock_field(&self.field);
                let advanced = matches!(field.advance(), TickOutcome::Advanced(_));
                if advanced {
                    let ticks = self.ticks_advanced.fetch_add(1, Ordering::Relaxed) + 1;
                    if self.tick_limit == Some(ticks) {
                        field.set_paused(true);
                        debug!(ticks, "Tick limit reached, field paused");
                    }
                }
                let changed = self.dirty.swap(false, Ordering::AcqRel);
                (advanced || changed).then(|| field.snapshot())
            };

            // 2. Publish without the lock.
            if let Some(snapshot) = snapshot {
                self.ring.push(snapshot);
            }

            // 3. Sleep for the remaining budget.
            if let Some(remaining) = self.tick_budget.checked_sub(tick_start.elapsed()) {
                if !self.shutdown_flag.load(Ordering::Acquire) {
                    thread::park_timeout(remaining);
                }
            }
        }

        self.tick_stopped.store(true, Ordering::Release);
        debug!("Tick thread stopped");
    }
}
