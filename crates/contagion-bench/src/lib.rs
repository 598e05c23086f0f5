//! Benchmark profiles for the contagion field simulator.
//!
//! Provides pre-built [`FieldConfig`] profiles for benchmarking:
//!
//! - [`reference_profile`]: the default 200-subject field
//! - [`stress_profile`]: 2 000 subjects on a field scaled to keep the
//!   reference density
//! - [`outbreak_profile`]: a dense field where most contacts infect, so the
//!   transmission pass does real work every tick

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use contagion_core::{Bounds, Vec2};
use contagion_engine::FieldConfig;

/// The default configuration, seeded.
pub fn reference_profile(seed: u64) -> FieldConfig {
    FieldConfig {
        seed: Some(seed),
        ..FieldConfig::default()
    }
}

/// 2 000 subjects, 20 sick, on a field with ten times the reference area.
pub fn stress_profile(seed: u64) -> FieldConfig {
    let scale = 10f64.sqrt();
    let bounds = Bounds::new(Vec2::ZERO, Vec2::new(640.0 * scale, 480.0 * scale));
    FieldConfig {
        subject_count: 2_000,
        initial_sick: 20,
        destination: bounds.center(),
        bounds,
        seed: Some(seed),
        ..FieldConfig::default()
    }
}

/// 500 subjects on the reference field with a wide radius and high odds.
/// Infections last long enough that the outbreak is still growing during
/// a benchmark run.
pub fn outbreak_profile(seed: u64) -> FieldConfig {
    FieldConfig {
        subject_count: 500,
        initial_sick: 25,
        infection_radius: 60.0,
        odds_of_infection: 0.9,
        time_scale: 4,
        min_infection_time: 500,
        max_infection_time: 600,
        seed: Some(seed),
        ..FieldConfig::default()
    }
}
