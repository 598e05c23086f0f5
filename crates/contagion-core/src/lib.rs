//! Core types for the contagion field simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental vocabulary shared by the engine, the driver and the
//! test fixtures: typed IDs, the three-state health model, per-status
//! counts, and the 2D geometry used by movement and transmission.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod geometry;
pub mod health;
pub mod id;

pub use geometry::{Bounds, Vec2};
pub use health::{HealthStatus, StatusCounts};
pub use id::{ObserverId, SubjectId, TickId};
