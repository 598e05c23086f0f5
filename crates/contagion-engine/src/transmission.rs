//! The per-tick transmission pass.
//!
//! Every (infected, susceptible) pair closer than the infection radius
//! gets one Bernoulli trial. Evaluation order is pinned:
//!
//! - **Sources** are the subjects infected when the pass starts. A
//!   subject infected during the pass does not spread until next tick.
//! - **Targets** are filtered on their live status, so a subject exposed
//!   to several sources is infected at most once; later trials against
//!   it are skipped.
//!
//! The result therefore does not depend on where newly infected subjects
//! happen to sit in the population order.

use contagion_core::{HealthStatus, SubjectId, TickId, Vec2};
use rand::Rng;
use smallvec::SmallVec;

use crate::config::DurationRange;
use crate::subject::Subject;

/// Subjects infected during one pass, in infection order.
pub type Infections = SmallVec<[SubjectId; 8]>;

/// Parameters of one transmission pass.
#[derive(Clone, Copy, Debug)]
pub struct TransmissionParams {
    /// Pairs must be strictly closer than this squared distance.
    pub radius_squared: f64,
    /// Success probability of each in-range trial.
    pub probability: f64,
    /// Duration given to each new infection.
    pub duration: DurationRange,
}

/// Run one transmission pass over `subjects` at `tick`.
pub fn spread<R: Rng + ?Sized>(
    subjects: &mut [Subject],
    params: &TransmissionParams,
    tick: TickId,
    rng: &mut R,
) -> Infections {
    let mut infected = Infections::new();
    if params.radius_squared <= 0.0 || params.probability <= 0.0 {
        return infected;
    }

    let sources: Vec<Vec2> = subjects
        .iter()
        .filter(|s| s.status() == HealthStatus::Infected)
        .map(Subject::position)
        .collect();

    for source in sources {
        for (index, target) in subjects.iter_mut().enumerate() {
            if target.status() != HealthStatus::Susceptible {
                continue;
            }
            if source.distance_squared(target.position()) >= params.radius_squared {
                continue;
            }
            if rng.random::<f64>() < params.probability {
                target.infect(tick, params.duration.sample(rng));
                infected.push(SubjectId(index as u32));
            }
        }
    }
    infected
}
