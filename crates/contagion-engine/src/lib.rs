//! Stepping engine for the contagion field simulator.
//!
//! Provides [`SimulationField`], the passive per-tick state machine that
//! moves subjects, spreads the infection and keeps population statistics,
//! and [`RealtimeField`], which drives a field from a paced background
//! thread while serving snapshots to readers without blocking it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod field;
pub mod metrics;
pub mod observer;
pub mod realtime;
pub mod ring;
pub mod stats;
pub mod subject;
pub mod transmission;

mod tick_thread;

pub use config::{ConfigError, DurationRange, FieldConfig, ParameterChange, RealtimeConfig};
pub use field::{
    EngineState, FieldSnapshot, SimulationField, SubjectView, TickOutcome, TickReport,
};
pub use metrics::StepMetrics;
pub use observer::{FieldEvent, Observers};
pub use realtime::{RealtimeField, ShutdownReport};
pub use stats::{StatusSample, TimeSeries};
pub use subject::Subject;
pub use transmission::Infections;
