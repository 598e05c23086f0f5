//! Contagion: an agent-based epidemic field simulator.
//!
//! A fixed population of point subjects drifts around a bounded 2D field
//! under random forces and friction, optionally travelling to a shared
//! destination, and passes an infection on by proximity. Each subject is
//! susceptible, infected or removed; the field tracks per-tick counts, the
//! peak infected count and the tick the infection died out.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the contagion sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use contagion::prelude::*;
//!
//! let config = FieldConfig {
//!     subject_count: 50,
//!     initial_sick: 1,
//!     seed: Some(7),
//!     ..FieldConfig::default()
//! };
//! let mut field = SimulationField::new(config).unwrap();
//! assert_eq!(field.counts().infected, 1);
//!
//! let first = field.current_tick();
//! if let TickOutcome::Advanced(report) = field.advance() {
//!     assert_eq!(report.tick, first);
//!     assert_eq!(report.counts.total(), 50);
//! }
//! assert_eq!(field.current_tick(), first.next());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `contagion-core` | IDs, `HealthStatus`, `StatusCounts`, `Vec2`, `Bounds` |
//! | [`engine`] | `contagion-engine` | Configuration, subjects, the lockstep field and the paced driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and geometry (`contagion-core`).
pub use contagion_core as types;

/// Simulation engine (`contagion-engine`).
///
/// [`engine::SimulationField`] for synchronous stepping,
/// [`engine::RealtimeField`] for paced background ticking.
pub use contagion_engine as engine;

/// Common imports for typical usage.
///
/// ```rust
/// use contagion::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use contagion_core::{
        Bounds, HealthStatus, ObserverId, StatusCounts, SubjectId, TickId, Vec2,
    };

    // Configuration and errors
    pub use contagion_engine::{ConfigError, FieldConfig, ParameterChange, RealtimeConfig};

    // Engines
    pub use contagion_engine::{
        EngineState, FieldSnapshot, RealtimeField, ShutdownReport, SimulationField, SubjectView,
        TickOutcome, TickReport,
    };

    // Observation
    pub use contagion_engine::{FieldEvent, StatusSample, StepMetrics, TimeSeries};
}
