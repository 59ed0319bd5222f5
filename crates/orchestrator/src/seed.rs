//! Deterministic initial-population seeding.
//!
//! Queues the configured per-species particle counts at uniformly random
//! positions inside the spawn sphere. The same seed always reproduces the
//! same population; queued particles become live at the next tick's drain.

use engine::{InteractionPolicy, Particle, ParticleEngine};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;

/// Queue the configured initial population into `engine`.
///
/// Returns the number of particles admitted to the emission queue. Stops
/// early (with a warning) if the engine's capacity backpressure rejects an
/// emission, which a validated configuration never triggers.
pub fn seed_engine<P>(engine: &mut ParticleEngine<P>, config: &SimulationConfig) -> usize
where
    P: InteractionPolicy + Sync,
{
    let mut rng = StdRng::seed_from_u64(config.seeding.rng_seed);
    let center = Vec3::from_array(config.field.center);
    let radius = config.seeding.spawn_radius;

    let mut admitted = 0;
    for (species, &count) in config.seeding.counts.iter().enumerate() {
        for _ in 0..count {
            let position = center + sample_in_unit_sphere(&mut rng) * radius;
            if !engine.try_emit(Particle::new(position, species as u32)) {
                tracing::warn!(species, admitted, "seeding stopped: engine is full");
                return admitted;
            }
            admitted += 1;
        }
    }
    admitted
}

/// Uniform sample inside the unit sphere (rejection from the unit cube).
fn sample_in_unit_sphere(rng: &mut StdRng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}
