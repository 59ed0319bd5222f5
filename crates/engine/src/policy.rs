//! Species/interaction behavior supplied by the embedding application.
//!
//! The core holds a policy by value and calls into it at fixed points of
//! the pipeline; it never depends on concrete species logic. Hooks receive
//! the per-species (and, for pairs, per-species-pair) parameter blocks the
//! engine was constructed with.

use glam::Vec3;

use crate::particle::{Particle, SocialData, SpeciesData};

/// Pluggable per-species behavior the pipeline calls into.
///
/// Implementations must be `Sync`: hooks run concurrently from the stage
/// workers, each on a particle that worker owns exclusively.
pub trait InteractionPolicy {
    /// Apply global forces to `particle` during integration. May mutate the
    /// position in place; the implied velocity picks the change up on the
    /// next tick.
    fn global_forces(&self, particle: &mut Particle, species: &SpeciesData);

    /// Enforce boundaries and fields on `particle` at the end of collision
    /// resolution. The engine doubles whatever correction this applies
    /// (overshoot-and-settle), so a plain clamp converges in a tick or two.
    fn constraints(&self, particle: &mut Particle, species: &SpeciesData);

    /// Whether `particle` should be culled by the next maintenance pass.
    ///
    /// The pipeline itself never removes particles; see
    /// [`ParticleEngine::remove_killed`](crate::ParticleEngine::remove_killed).
    fn should_kill(&self, _particle: &Particle) -> bool {
        false
    }

    /// Pairwise interaction evaluated inside the collision stage's neighbor
    /// traversal. Return a displacement contribution to participate; the
    /// engine averages contributions over the number of interacting
    /// neighbors and applies the result to `particle`'s position.
    fn pairwise(
        &self,
        _particle: &Particle,
        _species: &SpeciesData,
        _other: &Particle,
        _other_species: &SpeciesData,
        _social: &SocialData,
    ) -> Option<Vec3> {
        None
    }
}

/// Inert policy: no forces, no constraints, no interactions.
///
/// Useful for tests and for running the collision pipeline bare.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPolicy;

impl InteractionPolicy for NullPolicy {
    fn global_forces(&self, _particle: &mut Particle, _species: &SpeciesData) {}

    fn constraints(&self, _particle: &mut Particle, _species: &SpeciesData) {}
}
