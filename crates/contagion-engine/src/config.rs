//! Field configuration, validation, and error types.
//!
//! [`FieldConfig`] holds every parameter the engine re-reads each tick.
//! [`validate()`](FieldConfig::validate) checks all invariants up front so
//! that degenerate ranges and divide-by-zero never reach the stepping loop.
//! Individual options are changed at runtime through [`ParameterChange`],
//! which the field applies to a candidate copy, validates, and only then
//! commits (validate-before-apply).

use std::time::Duration;

use contagion_core::{Bounds, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a configuration or starting a driver.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Population size is zero.
    #[error("subject_count must be at least 1")]
    EmptyPopulation,
    /// More initially sick subjects than the population allows.
    #[error("initial_sick ({initial_sick}) must be below subject_count ({subject_count})")]
    TooManyInitialSick {
        /// The configured initial-sick count.
        initial_sick: usize,
        /// The configured population size.
        subject_count: usize,
    },
    /// Subject mass is NaN, infinite, zero, or negative.
    #[error("subject_mass must be finite and positive, got {value}")]
    InvalidMass {
        /// The invalid value.
        value: f64,
    },
    /// Friction factor outside the open interval `(0, 1)`.
    #[error("friction_factor must be in (0, 1), got {value}")]
    InvalidFriction {
        /// The invalid value.
        value: f64,
    },
    /// Field bounds are not finite or `lo >= hi` on some axis.
    #[error("bounds must be finite with lo < hi on both axes, got lo={lo:?} hi={hi:?}")]
    InvalidBounds {
        /// Configured lower corner.
        lo: Vec2,
        /// Configured upper corner.
        hi: Vec2,
    },
    /// Destination point has a non-finite component.
    #[error("destination must be finite, got {value:?}")]
    InvalidDestination {
        /// The invalid point.
        value: Vec2,
    },
    /// A probability lies outside `[0, 1]` or is NaN.
    #[error("{name} must be in [0, 1], got {value}")]
    InvalidProbability {
        /// Which option was rejected.
        name: &'static str,
        /// The invalid value.
        value: f64,
    },
    /// Infection radius is NaN, infinite, or negative.
    #[error("infection_radius must be finite and non-negative, got {value}")]
    InvalidInfectionRadius {
        /// The invalid value.
        value: f64,
    },
    /// A `min..max` duration range has `min > max`.
    #[error("{name} range is inverted: min {min} > max {max}")]
    InvalidDurationRange {
        /// Which range was rejected.
        name: &'static str,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },
    /// Time scale is zero.
    #[error("time_scale must be at least 1")]
    InvalidTimeScale,
    /// tick_rate_hz is NaN, infinite, zero, or negative.
    #[error("tick_rate_hz must be finite and positive, got {value}")]
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// tick_limit is zero.
    #[error("tick_limit must be at least 1")]
    InvalidTickLimit,
    /// Snapshot ring size is below the minimum of 2.
    #[error("snapshot_ring_size {configured} is below minimum of 2")]
    RingBufferTooSmall {
        /// The configured size that was too small.
        configured: usize,
    },
    /// A configuration document could not be parsed.
    #[error("could not parse configuration: {reason}")]
    Parse {
        /// Parser message.
        reason: String,
    },
    /// A background thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

// ── FieldConfig ────────────────────────────────────────────────────

/// Complete set of parameters for a simulation field.
///
/// `Default` reproduces the reference setup: 200 subjects on a 640×480
/// field, two of them sick, infections lasting 7 to 21 days at 72 ticks
/// per day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Population size.
    pub subject_count: usize,
    /// Mass dividing every applied force.
    pub subject_mass: f64,
    /// Multiplicative velocity decay per tick, in `(0, 1)`.
    pub friction_factor: f64,
    /// Per-tick probability that one random subject is sent to the destination.
    pub odds_of_destination: f64,
    /// Number of subjects infected at initialization.
    pub initial_sick: usize,
    /// Transmission range.
    pub infection_radius: f64,
    /// Per-day probability of transmission for a pair within range.
    pub odds_of_infection: f64,
    /// Minimum infection duration in days (inclusive).
    pub min_infection_time: u32,
    /// Maximum infection duration in days (exclusive unless equal to the minimum).
    pub max_infection_time: u32,
    /// Ticks per day. Scales infection durations and divides the odds of infection.
    pub time_scale: u32,
    /// Minimum ticks a subject keeps travelling to the destination (inclusive).
    pub min_stay_time: u32,
    /// Maximum ticks a subject keeps travelling to the destination.
    pub max_stay_time: u32,
    /// RNG seed. `None` draws a fresh seed, so runs are not reproducible.
    pub seed: Option<u64>,
    /// Rectangle confining every subject.
    pub bounds: Bounds,
    /// Point subjects travel to when destination seeking is enabled.
    pub destination: Vec2,
}

impl Default for FieldConfig {
    fn default() -> Self {
        let bounds = Bounds::new(Vec2::ZERO, Vec2::new(640.0, 480.0));
        Self {
            subject_count: 200,
            subject_mass: 10.0,
            friction_factor: 0.98,
            destination: bounds.center(),
            bounds,
            odds_of_destination: 0.02,
            initial_sick: 2,
            infection_radius: 30.0,
            odds_of_infection: 0.2,
            min_infection_time: 7,
            max_infection_time: 21,
            time_scale: 72,
            min_stay_time: 36,
            max_stay_time: 72,
            seed: None,
        }
    }
}

impl FieldConfig {
    /// Validate all invariants, returning the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Population.
        if self.subject_count == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.initial_sick >= self.subject_count {
            return Err(ConfigError::TooManyInitialSick {
                initial_sick: self.initial_sick,
                subject_count: self.subject_count,
            });
        }
        // 2. Physics.
        if !self.subject_mass.is_finite() || self.subject_mass <= 0.0 {
            return Err(ConfigError::InvalidMass {
                value: self.subject_mass,
            });
        }
        if !(self.friction_factor > 0.0 && self.friction_factor < 1.0) {
            return Err(ConfigError::InvalidFriction {
                value: self.friction_factor,
            });
        }
        if !self.bounds.is_valid() {
            return Err(ConfigError::InvalidBounds {
                lo: self.bounds.lo,
                hi: self.bounds.hi,
            });
        }
        // 3. Destination seeking.
        if !self.destination.is_finite() {
            return Err(ConfigError::InvalidDestination {
                value: self.destination,
            });
        }
        check_probability("odds_of_destination", self.odds_of_destination)?;
        check_range("stay_time", self.min_stay_time, self.max_stay_time)?;
        // 4. Contagion.
        if !self.infection_radius.is_finite() || self.infection_radius < 0.0 {
            return Err(ConfigError::InvalidInfectionRadius {
                value: self.infection_radius,
            });
        }
        check_probability("odds_of_infection", self.odds_of_infection)?;
        check_range(
            "infection_time",
            self.min_infection_time,
            self.max_infection_time,
        )?;
        if self.time_scale == 0 {
            return Err(ConfigError::InvalidTimeScale);
        }
        Ok(())
    }

    /// Parse a TOML document and validate the result.
    ///
    /// Options missing from the document keep their default values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Per-tick, per-pair transmission probability.
    pub fn transmission_probability(&self) -> f64 {
        self.odds_of_infection / f64::from(self.time_scale)
    }

    /// Squared infection radius, compared against squared distances.
    pub fn infection_radius_squared(&self) -> f64 {
        self.infection_radius * self.infection_radius
    }

    /// Infection duration in ticks: `time_scale * [min, max)` days.
    pub fn infection_duration(&self) -> DurationRange {
        DurationRange {
            min: self.min_infection_time,
            max: self.max_infection_time,
            scale: self.time_scale,
        }
    }

    /// Destination stay in ticks: `[min, max)`, unscaled.
    pub fn stay_duration(&self) -> DurationRange {
        DurationRange {
            min: self.min_stay_time,
            max: self.max_stay_time,
            scale: 1,
        }
    }
}

// ── DurationRange ──────────────────────────────────────────────────

/// A `scale * Uniform[min, max)` tick duration.
///
/// A degenerate range (`min >= max`) always yields `scale * min`
/// instead of sampling an empty interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DurationRange {
    /// Lower bound (inclusive), before scaling.
    pub min: u32,
    /// Upper bound (exclusive), before scaling.
    pub max: u32,
    /// Multiplier applied to the sampled value.
    pub scale: u32,
}

impl DurationRange {
    /// Draw one duration in ticks.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let base = if self.min >= self.max {
            self.min
        } else {
            rng.random_range(self.min..self.max)
        };
        u64::from(self.scale) * u64::from(base)
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

fn check_range(name: &'static str, min: u32, max: u32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidDurationRange { name, min, max })
    }
}

// ── ParameterChange ────────────────────────────────────────────────

/// A single runtime change to one configuration option.
///
/// Paired ranges are changed together so a change can never pass through
/// an inverted intermediate state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterChange {
    /// Population size. Reinitializes.
    SubjectCount(usize),
    /// Subject mass.
    SubjectMass(f64),
    /// Friction factor.
    FrictionFactor(f64),
    /// Field bounds. Subjects outside the new rectangle, removed ones
    /// included, are moved onto its nearest wall when the change commits.
    Bounds(Bounds),
    /// Destination point.
    Destination(Vec2),
    /// Per-tick probability of sending a subject to the destination.
    OddsOfDestination(f64),
    /// Number of subjects infected at initialization. Reinitializes.
    InitialSick(usize),
    /// Transmission range. Reinitializes.
    InfectionRadius(f64),
    /// Per-day transmission probability.
    OddsOfInfection(f64),
    /// Infection duration range, in days.
    InfectionTime {
        /// Minimum (inclusive).
        min: u32,
        /// Maximum.
        max: u32,
    },
    /// Ticks per day.
    TimeScale(u32),
    /// Destination stay range, in ticks.
    StayTime {
        /// Minimum (inclusive).
        min: u32,
        /// Maximum.
        max: u32,
    },
}

impl ParameterChange {
    /// Write this change into `config`. Does not validate.
    pub fn apply_to(&self, config: &mut FieldConfig) {
        match *self {
            Self::SubjectCount(n) => config.subject_count = n,
            Self::SubjectMass(m) => config.subject_mass = m,
            Self::FrictionFactor(f) => config.friction_factor = f,
            Self::Bounds(b) => config.bounds = b,
            Self::Destination(d) => config.destination = d,
            Self::OddsOfDestination(p) => config.odds_of_destination = p,
            Self::InitialSick(n) => config.initial_sick = n,
            Self::InfectionRadius(r) => config.infection_radius = r,
            Self::OddsOfInfection(p) => config.odds_of_infection = p,
            Self::InfectionTime { min, max } => {
                config.min_infection_time = min;
                config.max_infection_time = max;
            }
            Self::TimeScale(s) => config.time_scale = s,
            Self::StayTime { min, max } => {
                config.min_stay_time = min;
                config.max_stay_time = max;
            }
        }
    }

    /// Whether the population must be rebuilt for this change to take effect.
    pub fn requires_reinitialize(&self) -> bool {
        matches!(
            self,
            Self::SubjectCount(_) | Self::InitialSick(_) | Self::InfectionRadius(_)
        )
    }

    /// Name of the option this change targets.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubjectCount(_) => "subject_count",
            Self::SubjectMass(_) => "subject_mass",
            Self::FrictionFactor(_) => "friction_factor",
            Self::Bounds(_) => "bounds",
            Self::Destination(_) => "destination",
            Self::OddsOfDestination(_) => "odds_of_destination",
            Self::InitialSick(_) => "initial_sick",
            Self::InfectionRadius(_) => "infection_radius",
            Self::OddsOfInfection(_) => "odds_of_infection",
            Self::InfectionTime { .. } => "infection_time",
            Self::TimeScale(_) => "time_scale",
            Self::StayTime { .. } => "stay_time",
        }
    }
}

// ── RealtimeConfig ─────────────────────────────────────────────────

/// Configuration for [`RealtimeField`](crate::realtime::RealtimeField).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Target tick rate of the background loop. Default: 100 (10 ms per tick).
    pub tick_rate_hz: f64,
    /// Number of published snapshots retained for readers. Default: 8. Minimum: 2.
    pub snapshot_ring_size: usize,
    /// Pause the field once the background thread has simulated this many
    /// ticks. Default: `None` (run until paused or shut down).
    pub tick_limit: Option<u64>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 100.0,
            snapshot_ring_size: 8,
            tick_limit: None,
        }
    }
}

impl RealtimeConfig {
    /// Validate pacing and ring invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The reciprocal must also be finite: subnormal rates would make
        // Duration::from_secs_f64 panic.
        let hz = self.tick_rate_hz;
        if !hz.is_finite() || hz <= 0.0 || !(1.0 / hz).is_finite() {
            return Err(ConfigError::InvalidTickRate { value: hz });
        }
        if self.snapshot_ring_size < 2 {
            return Err(ConfigError::RingBufferTooSmall {
                configured: self.snapshot_ring_size,
            });
        }
        if self.tick_limit == Some(0) {
            return Err(ConfigError::InvalidTickLimit);
        }
        Ok(())
    }

    /// Wall-clock budget of one tick. Call only on a validated config.
    pub fn tick_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}
