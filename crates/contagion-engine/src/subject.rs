//! One simulated agent: position, velocity, health status and travel plan.

use std::f64::consts::TAU;

use contagion_core::{Bounds, HealthStatus, TickId, Vec2};
use rand::Rng;

/// Upper bound on the magnitude of the per-tick random push.
pub const MAX_RANDOM_FORCE: f64 = 2.0;
/// Peak magnitude of the pull toward an active destination.
pub const DESTINATION_FORCE_FACTOR: f64 = 1.0;
/// Upper bound on the speed a subject is created with.
pub const SUBJECT_INITIAL_MAX_VELOCITY: f64 = 1.0;
/// Distance inside which the destination pull tapers linearly to zero.
pub const ARRIVAL_RADIUS: f64 = 20.0;

/// Physical parameters shared by every subject during one tick.
#[derive(Clone, Copy, Debug)]
pub struct MotionParams {
    /// Divides applied forces.
    pub mass: f64,
    /// Velocity multiplier applied after force integration, in `(0, 1)`.
    pub friction: f64,
    /// Walls the subject reflects off.
    pub bounds: Bounds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Travel {
    destination: Vec2,
    return_tick: TickId,
}

/// A simulated subject.
///
/// `event_tick` is the tick the current status began; for a subject that
/// never changed status it is the creation tick, which staggers animation
/// phases. `change_tick` is when the current status is scheduled to end,
/// `None` when nothing is scheduled.
#[derive(Clone, Debug, PartialEq)]
pub struct Subject {
    position: Vec2,
    velocity: Vec2,
    status: HealthStatus,
    event_tick: TickId,
    change_tick: Option<TickId>,
    travel: Option<Travel>,
}

impl Subject {
    /// A susceptible subject created at `created`.
    pub fn new(position: Vec2, velocity: Vec2, created: TickId) -> Self {
        Self {
            position,
            velocity,
            status: HealthStatus::Susceptible,
            event_tick: created,
            change_tick: None,
            travel: None,
        }
    }

    /// A susceptible subject placed uniformly inside `bounds` with a random
    /// initial velocity.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds, created: TickId) -> Self {
        let size = bounds.size();
        let position = Vec2::new(
            bounds.lo.x + rng.random::<f64>() * size.x,
            bounds.lo.y + rng.random::<f64>() * size.y,
        );
        Self::new(
            position,
            random_vector(rng, SUBJECT_INITIAL_MAX_VELOCITY),
            created,
        )
    }

    /// Current location.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity.
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Current health status.
    pub fn status(&self) -> HealthStatus {
        self.status
    }

    /// Tick the current status began (creation tick if never changed).
    pub fn event_tick(&self) -> TickId {
        self.event_tick
    }

    /// Tick the current status is scheduled to end, if any.
    pub fn change_tick(&self) -> Option<TickId> {
        self.change_tick
    }

    /// Active travel goal, if any.
    pub fn destination(&self) -> Option<Vec2> {
        self.travel.map(|t| t.destination)
    }

    /// Tick at which the active travel ends, if any.
    pub fn return_tick(&self) -> Option<TickId> {
        self.travel.map(|t| t.return_tick)
    }

    /// Move the subject to `position`. Reflection on the next update brings
    /// it back inside the field if it lies outside.
    pub fn place(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Pull the subject back inside `bounds` immediately, whatever its
    /// status. Used when the field shrinks under frozen subjects.
    pub fn confine(&mut self, bounds: &Bounds) {
        bounds.reflect(&mut self.position, &mut self.velocity);
    }

    /// Overwrite the current velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Send the subject toward `destination` until `return_tick`.
    pub fn assign_destination(&mut self, destination: Vec2, return_tick: TickId) {
        self.travel = Some(Travel {
            destination,
            return_tick,
        });
    }

    /// Move to `next` at `tick`, scheduling the following change `duration`
    /// ticks later.
    ///
    /// Returns `false` and leaves the subject untouched when the health
    /// model does not allow the transition, which makes `Removed` absorbing
    /// and repeated infection a no-op.
    pub fn transition(&mut self, next: HealthStatus, tick: TickId, duration: Option<u64>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.event_tick = tick;
        self.change_tick = duration.map(|d| tick.offset(d));
        true
    }

    /// Infect a susceptible subject at `tick` for `duration` ticks.
    pub fn infect(&mut self, tick: TickId, duration: u64) -> bool {
        self.transition(HealthStatus::Infected, tick, Some(duration))
    }

    /// Whether an infected subject has reached its scheduled removal.
    pub fn is_due_for_removal(&self, tick: TickId) -> bool {
        self.status == HealthStatus::Infected && self.change_tick.is_some_and(|c| tick >= c)
    }

    /// Advance physics and status by one tick.
    ///
    /// Removed subjects are frozen. Otherwise: integrate `random_force` plus
    /// the destination pull into the velocity, apply friction, move, reflect
    /// off the walls, end travel once `return_tick` is reached, and remove
    /// the subject if its infection has run its course.
    ///
    /// Returns `true` if the subject was removed during this update.
    pub fn update(&mut self, params: &MotionParams, random_force: Vec2, tick: TickId) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        let force = random_force + self.seek_force();
        self.velocity = (self.velocity + force / params.mass) * params.friction;
        self.position += self.velocity;
        params.bounds.reflect(&mut self.position, &mut self.velocity);

        if self.travel.is_some_and(|t| tick >= t.return_tick) {
            self.travel = None;
        }

        if self.is_due_for_removal(tick) {
            return self.transition(HealthStatus::Removed, tick, None);
        }
        false
    }

    /// Pull toward the active destination.
    ///
    /// Full strength far away, tapering linearly inside [`ARRIVAL_RADIUS`]
    /// so friction settles the subject on the goal instead of orbiting it.
    fn seek_force(&self) -> Vec2 {
        let Some(travel) = self.travel else {
            return Vec2::ZERO;
        };
        let offset = travel.destination - self.position;
        match offset.normalized() {
            Some(direction) => {
                let taper = (offset.length() / ARRIVAL_RADIUS).min(1.0);
                direction * (DESTINATION_FORCE_FACTOR * taper)
            }
            None => Vec2::ZERO,
        }
    }
}

/// Vector of magnitude `Uniform(0, max)` in a uniformly random direction.
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R, max: f64) -> Vec2 {
    let angle = rng.random::<f64>() * TAU;
    let magnitude = rng.random::<f64>() * max;
    Vec2::from_polar(magnitude, angle)
}
