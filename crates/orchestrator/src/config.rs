//! Configuration parsing and validation for particle simulations.

use engine::{EngineParams, SocialData, SocialMatrix, SpeciesData};
use serde::{Deserialize, Serialize};
use std::fs;

/// Main simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Human-readable simulation name.
    pub name: String,
    /// Core engine parameters (capacity, grid, damping, threading).
    #[serde(default)]
    pub engine: EngineParams,
    /// Per-species parameters, indexed by species id.
    #[serde(default = "default_species")]
    pub species: Vec<SpeciesData>,
    /// Social interaction entries; unordered pairs, later entries win.
    #[serde(default)]
    pub social: Vec<SocialEntry>,
    /// Attraction field driving the reference policy.
    #[serde(default)]
    pub field: FieldConfig,
    /// Initial population seeding.
    #[serde(default)]
    pub seeding: SeedingConfig,
}

/// One unordered species pair's social parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SocialEntry {
    /// First species of the pair.
    pub a: u32,
    /// Second species of the pair.
    pub b: u32,
    /// Signed social force magnitude (positive attracts).
    pub force: f32,
    /// Maximum interaction distance.
    pub range: f32,
}

/// Central attraction field and containment sphere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Field center in world space.
    #[serde(default)]
    pub center: [f32; 3],
    /// Containment radius; particles outside are pulled back and clamped.
    #[serde(default = "default_field_radius")]
    pub radius: f32,
    /// Per-tick displacement applied to out-of-field particles.
    #[serde(default = "default_field_force")]
    pub force: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            radius: default_field_radius(),
            force: default_field_force(),
        }
    }
}

/// Deterministic initial-population parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingConfig {
    /// Particles to spawn per species (index = species id).
    #[serde(default)]
    pub counts: Vec<usize>,
    /// Radius of the spawn sphere around the field center.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f32,
    /// RNG seed; the same seed reproduces the same population.
    #[serde(default)]
    pub rng_seed: u64,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            counts: Vec::new(),
            spawn_radius: default_spawn_radius(),
            rng_seed: 0,
        }
    }
}

// Default values

fn default_species() -> Vec<SpeciesData> {
    vec![SpeciesData::default()]
}

fn default_field_radius() -> f32 {
    0.5
}

fn default_field_force() -> f32 {
    0.0005
}

fn default_spawn_radius() -> f32 {
    0.3
}

impl SimulationConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path, e))?;

        let config: SimulationConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse config JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let e = &self.engine;

        if e.max_particles == 0 {
            return Err("max_particles must be at least 1".to_string());
        }
        if e.chunk_side < 4 {
            return Err("chunk_side must be at least 4".to_string());
        }
        if e.chunk_size <= 0.0 {
            return Err("chunk_size must be positive".to_string());
        }
        if e.particle_diameter <= 0.0 {
            return Err("particle_diameter must be positive".to_string());
        }
        // The 2x2x2 neighbor scan only covers one cell-width around each
        // particle, so wider particles would miss collisions.
        if e.particle_diameter > e.chunk_size {
            return Err("particle_diameter must not exceed chunk_size".to_string());
        }
        if !(0.0..=1.0).contains(&e.damping) {
            return Err("damping must be in [0, 1]".to_string());
        }
        if e.threads == Some(0) {
            return Err("threads must be at least 1 when specified".to_string());
        }

        if self.species.is_empty() {
            return Err("at least one species is required".to_string());
        }
        let n = self.species.len() as u32;
        for entry in &self.social {
            if entry.a >= n || entry.b >= n {
                return Err(format!(
                    "social entry ({}, {}) references an unknown species",
                    entry.a, entry.b
                ));
            }
        }

        if self.field.radius <= 0.0 {
            return Err("field radius must be positive".to_string());
        }

        if self.seeding.counts.len() > self.species.len() {
            return Err("seeding counts list a species that does not exist".to_string());
        }
        let seeded: usize = self.seeding.counts.iter().sum();
        if seeded > e.max_particles {
            return Err(format!(
                "seeding {} particles exceeds max_particles {}",
                seeded, e.max_particles
            ));
        }
        let bound = (e.chunk_side as f32 * 0.5 - 2.0) * e.chunk_size;
        if self.seeding.spawn_radius > bound {
            return Err(format!(
                "spawn_radius {} exceeds the addressable volume bound {}",
                self.seeding.spawn_radius, bound
            ));
        }

        Ok(())
    }

    /// Build the social matrix from the entry list.
    pub fn social_matrix(&self) -> SocialMatrix {
        let mut matrix = SocialMatrix::new(self.species.len());
        for entry in &self.social {
            matrix.set(
                entry.a,
                entry.b,
                SocialData {
                    force: entry.force,
                    range: entry.range,
                },
            );
        }
        matrix
    }
}
