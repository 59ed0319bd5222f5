//! Particle data model and per-species / per-species-pair parameters.
//!
//! Particles are stored array-of-structs: the bucket sort moves whole
//! particles between buffers, so keeping each particle contiguous makes the
//! scatter a single write.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identifier of a particle species, used to index the engine's species
/// table and the [`SocialMatrix`].
pub type SpeciesId = u32;

/// A single simulated particle.
///
/// Kinematic state is Verlet-style: velocity is implied by
/// `position - prev_position`. Each particle is owned exclusively by the
/// buffer slot holding it; no stage aliases a particle it does not own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Particle {
    /// Current position in world space.
    pub position: Vec3,
    /// Position at the end of the previous tick's integration.
    pub prev_position: Vec3,
    /// Species index into the engine's species table.
    pub species: SpeciesId,
}

impl Particle {
    /// Create a particle at rest (implied velocity zero).
    pub fn new(position: Vec3, species: SpeciesId) -> Self {
        Self {
            position,
            prev_position: position,
            species,
        }
    }

    /// Create a particle with an initial implied velocity, expressed as the
    /// displacement it carries into its first integration step.
    pub fn with_velocity(position: Vec3, velocity: Vec3, species: SpeciesId) -> Self {
        Self {
            position,
            prev_position: position - velocity,
            species,
        }
    }
}

/// Per-species simulation parameters.
///
/// The core never interprets these fields; they are handed to the active
/// [`InteractionPolicy`](crate::policy::InteractionPolicy) hooks alongside
/// each particle of the species.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpeciesData {
    /// Fraction of implied velocity a drag-applying policy removes per tick.
    #[serde(default)]
    pub drag: f32,
    /// Strength of the soft pairwise collision response, for policies that
    /// fold one into the neighbor traversal.
    #[serde(default)]
    pub collision_force: f32,
}

/// Parameters of the pairwise social interaction between two species.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SocialData {
    /// Signed magnitude of the social force (positive attracts).
    pub force: f32,
    /// Maximum distance at which the interaction applies.
    pub range: f32,
}

/// Symmetric per-species-pair table of [`SocialData`].
///
/// Indexed by an unordered pair: `get(a, b)` and `get(b, a)` always return
/// the same entry.
#[derive(Debug, Clone)]
pub struct SocialMatrix {
    species: usize,
    entries: Vec<SocialData>,
}

impl SocialMatrix {
    /// Create a matrix for `species` species with all entries inert.
    pub fn new(species: usize) -> Self {
        Self {
            species,
            entries: vec![SocialData::default(); species * species],
        }
    }

    /// Number of species the matrix covers.
    pub fn species(&self) -> usize {
        self.species
    }

    /// Set the entry for the unordered pair `(a, b)`.
    pub fn set(&mut self, a: SpeciesId, b: SpeciesId, data: SocialData) {
        let n = self.species;
        self.entries[a as usize * n + b as usize] = data;
        self.entries[b as usize * n + a as usize] = data;
    }

    /// Entry for the unordered pair `(a, b)`.
    #[inline]
    pub fn get(&self, a: SpeciesId, b: SpeciesId) -> &SocialData {
        &self.entries[a as usize * self.species + b as usize]
    }
}
