//! Test fixtures and helpers for contagion development.
//!
//! Provides seeded fixture configurations, helpers for scripting subject
//! placement, and a [`RecordingObserver`] that captures every
//! [`FieldEvent`] a field emits.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use contagion_core::{HealthStatus, ObserverId, SubjectId, TickId, Vec2};
use contagion_engine::{FieldEvent, SimulationField};

pub use fixtures::{
    certain_spread_config, default_seeded, isolated_pair_config, small_config, SEED,
};

/// Shared log of every event a field delivered.
///
/// Cloning yields another handle to the same log.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<FieldEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a new recorder to `field`.
    pub fn attach(field: &mut SimulationField) -> (Self, ObserverId) {
        let recorder = Self::new();
        let sink = recorder.clone();
        let id = field.subscribe(move |e| sink.push(*e));
        (recorder, id)
    }

    fn push(&self, event: FieldEvent) {
        self.events.lock().unwrap().push(event);
    }

    /// Every event received so far, oldest first.
    pub fn events(&self) -> Vec<FieldEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Ticks carried by the `TickCompleted` events received so far.
    pub fn completed_ticks(&self) -> Vec<TickId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FieldEvent::TickCompleted { tick, .. } => Some(tick),
                FieldEvent::ConfigurationChanged { .. } => None,
            })
            .collect()
    }

    /// Number of `ConfigurationChanged` events received so far.
    pub fn configuration_changes(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, FieldEvent::ConfigurationChanged { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// Move subject `id` to `position` and stop it.
pub fn place(field: &mut SimulationField, id: u32, position: Vec2) {
    let subject = field
        .subject_mut(SubjectId(id))
        .unwrap_or_else(|| panic!("no subject {id}"));
    subject.place(position);
    subject.set_velocity(Vec2::ZERO);
}

/// Statuses of every subject, in index order.
pub fn statuses(field: &SimulationField) -> Vec<HealthStatus> {
    field.subjects().iter().map(|s| s.status()).collect()
}

/// Advance `field` `n` times, ignoring the outcomes.
pub fn run_ticks(field: &mut SimulationField, n: usize) {
    for _ in 0..n {
        field.advance();
    }
}
