//! Orchestration Layer
//!
//! This crate assembles and drives the particle simulation core:
//! - JSON configuration parsing and validation
//! - Deterministic initial-population seeding
//! - The reference field/social interaction policy
//! - Simulation runner with lifecycle management

#![warn(missing_docs)]

pub mod config;
pub mod policy;
pub mod runner;
pub mod seed;

pub use config::SimulationConfig;
pub use policy::FieldPolicy;
pub use runner::SimulationRunner;

use engine::ParticleEngine;

/// Create a ready-to-step engine from a configuration file.
///
/// Performs the full setup pipeline:
/// 1. Load and validate the configuration
/// 2. Build the field policy the configuration describes
/// 3. Construct the engine (grid, worker pool, buffers, species tables)
/// 4. Queue the initial population
///
/// The seeded particles become live on the first [`ParticleEngine::step`].
///
/// # Example
/// ```no_run
/// let mut engine = orchestrator::create_engine("configs/ecosystem.json")?;
/// engine.step();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn create_engine(
    config_path: &str,
) -> Result<ParticleEngine<FieldPolicy>, Box<dyn std::error::Error>> {
    tracing::info!("Creating simulation from config: {}", config_path);

    // 1. Load and validate configuration
    let config = SimulationConfig::load(config_path)?;
    tracing::info!("Configuration loaded: {}", config.name);

    Ok(build_engine(&config))
}

/// Assemble and seed an engine from an already-validated configuration.
pub fn build_engine(config: &SimulationConfig) -> ParticleEngine<FieldPolicy> {
    // 2. Policy
    let policy = FieldPolicy::from_config(config);

    // 3. Engine
    let mut engine = ParticleEngine::new(
        config.engine.clone(),
        config.species.clone(),
        config.social_matrix(),
        policy,
    );
    tracing::info!(
        capacity = engine.capacity(),
        chunks = engine.grid().num_chunks(),
        "engine constructed"
    );

    // 4. Initial population
    let seeded = seed::seed_engine(&mut engine, config);
    tracing::info!(seeded, "initial population queued");

    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::EngineParams;

    #[test]
    fn build_engine_seeds_the_configured_population() {
        let mut config = SimulationConfig {
            name: "assembly".to_string(),
            engine: EngineParams {
                max_particles: 64,
                threads: Some(2),
                ..Default::default()
            },
            species: vec![Default::default(), Default::default()],
            social: Vec::new(),
            field: Default::default(),
            seeding: Default::default(),
        };
        config.seeding.counts = vec![12, 8];
        config.validate().expect("config is valid");

        let mut engine = build_engine(&config);
        assert_eq!(engine.pending(), 20);
        engine.step();
        assert_eq!(engine.alive(), 20);
    }
}
