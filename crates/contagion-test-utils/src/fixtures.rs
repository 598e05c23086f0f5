//! Reusable field configurations.
//!
//! - [`small_config`]: a 20-subject field with default physics.
//! - [`certain_spread_config`]: every in-range contact infects, and the
//!   radius covers the whole field.
//! - [`isolated_pair_config`]: one sick and one healthy subject, with
//!   certain transmission inside a radius of 10.

use contagion_core::{Bounds, Vec2};
use contagion_engine::FieldConfig;

/// Seed used by every fixture.
pub const SEED: u64 = 0x5EED;

/// The default configuration with a fixed seed.
pub fn default_seeded() -> FieldConfig {
    FieldConfig {
        seed: Some(SEED),
        ..FieldConfig::default()
    }
}

/// 20 subjects, 2 sick, default physics and contagion.
pub fn small_config() -> FieldConfig {
    FieldConfig {
        subject_count: 20,
        initial_sick: 2,
        ..default_seeded()
    }
}

/// `population` subjects, one sick, every contact within the field infects
/// with certainty. Infections last 50 to 60 ticks.
pub fn certain_spread_config(population: usize) -> FieldConfig {
    FieldConfig {
        subject_count: population,
        initial_sick: 1,
        bounds: Bounds::new(Vec2::ZERO, Vec2::new(100.0, 100.0)),
        destination: Vec2::new(50.0, 50.0),
        infection_radius: 200.0,
        odds_of_infection: 1.0,
        time_scale: 1,
        min_infection_time: 50,
        max_infection_time: 60,
        ..default_seeded()
    }
}

/// Two subjects on a 1000×1000 field: subject 0 sick, subject 1 healthy.
/// Transmission is certain within radius 10. Infections last 100 ticks.
pub fn isolated_pair_config() -> FieldConfig {
    FieldConfig {
        subject_count: 2,
        initial_sick: 1,
        bounds: Bounds::new(Vec2::ZERO, Vec2::new(1_000.0, 1_000.0)),
        destination: Vec2::new(500.0, 500.0),
        infection_radius: 10.0,
        odds_of_infection: 1.0,
        time_scale: 1,
        min_infection_time: 100,
        max_infection_time: 100,
        ..default_seeded()
    }
}
