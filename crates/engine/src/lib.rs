//! Real-Time Particle Simulation Core
//!
//! This crate provides the CPU simulation core for a species-based particle
//! ecosystem: thousands of point particles advance under per-species
//! forces, collide and depenetrate against grid-local neighbors, and expose
//! a read-only snapshot each tick for an external renderer.
//!
//! Each [`ParticleEngine::step`] runs a strict three-phase pipeline --
//! integrate, bucket-sort, resolve-collisions -- over a fixed worker pool.
//! Phase N+1 never starts before phase N has completed for all particles,
//! because each phase's input is the complete output of the previous one.
//!
//! # Modules
//! - [`particle`] -- particle data model and species/social parameters.
//! - [`grid`] -- uniform cubic grid mapping positions to collision chunks.
//! - [`pool`] -- fixed-width worker pool (the stage barriers).
//! - [`store`] -- double-buffered storage and the bounded emission queue.
//! - [`sort`] -- histogram / prefix-sum / lock-free scatter accounting.
//! - [`policy`] -- pluggable per-species behavior hooks.
//! - [`timing`] -- per-stage, per-worker diagnostics accumulator.

#![warn(missing_docs)]

pub mod grid;
pub mod particle;
pub mod policy;
pub mod pool;
pub mod sort;
pub mod store;
pub mod timing;

pub use grid::{ChunkGrid, ChunkIndex};
pub use particle::{Particle, SocialData, SocialMatrix, SpeciesData, SpeciesId};
pub use policy::{InteractionPolicy, NullPolicy};
pub use pool::WorkerPool;
pub use sort::ChunkLedger;
pub use store::ParticleStore;
pub use timing::{Stage, StageTimings};

use std::thread;
use std::time::Instant;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sort::ScatterTarget;

/// Displacements below this squared distance are treated as coincident and
/// skipped rather than normalized.
const MIN_DISTANCE_SQ: f32 = 1.0e-9;

/// Construction-time parameters of a [`ParticleEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Maximum number of live plus pending particles.
    pub max_particles: usize,
    /// Grid resolution per axis.
    pub chunk_side: usize,
    /// World-space edge length of one grid cell.
    pub chunk_size: f32,
    /// Collision diameter; two particles closer than this depenetrate.
    /// Must not exceed `chunk_size` or the neighbor scan loses coverage.
    pub particle_diameter: f32,
    /// Verlet damping applied to the implied velocity each tick.
    pub damping: f32,
    /// Worker count; `None` uses the machine's available parallelism.
    pub threads: Option<usize>,
    /// Whether to run the pipeline across the worker pool at all. When
    /// off, every stage runs inline on the calling thread.
    pub multithreading: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            max_particles: 1024,
            chunk_side: 16,
            chunk_size: 0.1,
            particle_diameter: 0.05,
            damping: 0.99,
            threads: None,
            multithreading: true,
        }
    }
}

/// The simulation core: particle buffers, spatial grid, worker pool, and
/// the three-phase tick pipeline.
pub struct ParticleEngine<P> {
    grid: ChunkGrid,
    pool: WorkerPool,
    store: ParticleStore,
    ledger: ChunkLedger,
    timings: StageTimings,
    species: Vec<SpeciesData>,
    social: SocialMatrix,
    policy: P,
    damping: f32,
    diameter: f32,
    threads: usize,
    multithreading: bool,
    ticks: u64,
}

impl<P> ParticleEngine<P>
where
    P: InteractionPolicy + Sync,
{
    /// Create an engine from parameters, species tables, and a policy.
    ///
    /// # Panics
    /// Panics when the parameters are inconsistent: no species, a social
    /// matrix sized for a different species count, a collision diameter
    /// wider than a grid cell, or damping outside `[0, 1]`.
    pub fn new(
        params: EngineParams,
        species: Vec<SpeciesData>,
        social: SocialMatrix,
        policy: P,
    ) -> Self {
        assert!(!species.is_empty(), "at least one species is required");
        assert_eq!(
            social.species(),
            species.len(),
            "social matrix species count must match the species table"
        );
        assert!(
            params.particle_diameter > 0.0 && params.particle_diameter <= params.chunk_size,
            "particle_diameter must be in (0, chunk_size]"
        );
        assert!(
            (0.0..=1.0).contains(&params.damping),
            "damping must be in [0, 1], got {}",
            params.damping
        );

        let grid = ChunkGrid::new(params.chunk_side, params.chunk_size);
        let threads = params
            .threads
            .unwrap_or_else(|| {
                thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1);
        let workers = if params.multithreading { threads } else { 1 };

        tracing::debug!(
            capacity = params.max_particles,
            chunks = grid.num_chunks(),
            workers,
            "particle engine created"
        );

        Self {
            grid,
            pool: WorkerPool::new(workers),
            store: ParticleStore::new(params.max_particles),
            ledger: ChunkLedger::new(grid.num_chunks()),
            timings: StageTimings::new(workers),
            species,
            social,
            policy,
            damping: params.damping,
            diameter: params.particle_diameter,
            threads,
            multithreading: params.multithreading,
            ticks: 0,
        }
    }

    /// Queue a particle for admission at the next tick.
    ///
    /// Returns `false` when the engine is at capacity or the particle
    /// references an unknown species; the caller decides whether to drop
    /// or retry later. Never blocks, never grows capacity.
    pub fn try_emit(&mut self, particle: Particle) -> bool {
        if particle.species as usize >= self.species.len() {
            tracing::warn!(
                species = particle.species,
                "rejecting emission with unknown species"
            );
            return false;
        }
        self.store.try_emit(particle)
    }

    /// Advance the simulation by one tick.
    ///
    /// Runs the full pipeline: integrate (parallel), drain emissions and
    /// rebuild the prefix sums (single-threaded), scatter into sorted
    /// order (parallel), resolve collisions and constraints (parallel).
    /// Runs to completion; there is no cancellation mid-tick.
    pub fn step(&mut self) {
        self.timings.reset();
        self.ledger.clear();

        self.integrate();

        // Both of these sit between the integrate and sort barriers and are
        // single-threaded by design: emitted particles must be counted in
        // the same histogram the sort consumes, and the prefix sum walks
        // the buckets in index order.
        self.store.drain_emissions(&self.grid, &self.ledger);
        let total = self.ledger.accumulate();
        debug_assert_eq!(
            total,
            self.store.alive(),
            "histogram total must equal the alive count"
        );

        self.scatter();
        self.resolve();

        self.ticks += 1;
    }

    /// Phase 1: advance kinematics, apply global forces, publish the new
    /// chunk of every particle into the histogram.
    fn integrate(&mut self) {
        let grid = self.grid;
        let damping = self.damping;
        let ledger = &self.ledger;
        let policy = &self.policy;
        let species = self.species.as_slice();
        let timings = &self.timings;
        let pool = &self.pool;
        let front = self.store.front_live_mut();

        pool.dispatch_chunks(front, |worker, _offset, chunk| {
            let begin = Instant::now();
            for particle in chunk.iter_mut() {
                let original = particle.position;
                particle.position += damping * (particle.position - particle.prev_position);
                policy.global_forces(particle, &species[particle.species as usize]);
                particle.prev_position = original;
                ledger.count_one(grid.chunk_of(particle.position));
            }
            timings.record(Stage::Integrate, worker, begin.elapsed());
        });
    }

    /// Phase 2: place every particle into its chunk's slice of the back
    /// buffer via the atomic write cursor.
    fn scatter(&mut self) {
        let grid = self.grid;
        let ledger = &self.ledger;
        let timings = &self.timings;
        let pool = &self.pool;
        let (front, back) = self.store.scatter_split();
        let target = ScatterTarget::new(back);

        pool.dispatch(front.len(), |worker, range| {
            let begin = Instant::now();
            for i in range {
                let particle = front[i];
                let slot = ledger.claim_slot(grid.chunk_of(particle.position));
                // SAFETY: claim_slot hands out each destination index
                // exactly once per pass, so this write is disjoint from
                // every other worker's.
                unsafe { target.write(slot, particle) };
            }
            timings.record(Stage::Sort, worker, begin.elapsed());
        });
    }

    /// Phase 3: depenetrate against grid-local neighbors, apply constraints
    /// through the overshoot reflection, and write the resolved particles
    /// back into the front buffer.
    fn resolve(&mut self) {
        let grid = self.grid;
        let diameter = self.diameter;
        let ledger = &self.ledger;
        let policy = &self.policy;
        let species = self.species.as_slice();
        let social = &self.social;
        let timings = &self.timings;
        let pool = &self.pool;
        let (front, sorted) = self.store.resolve_split();

        pool.dispatch_chunks(front, |worker, offset, chunk| {
            let begin = Instant::now();
            for (j, slot) in chunk.iter_mut().enumerate() {
                let index = offset + j;
                let mut particle = sorted[index];
                resolve_particle(
                    &mut particle,
                    index,
                    sorted,
                    &grid,
                    ledger,
                    diameter,
                    policy,
                    species,
                    social,
                );
                *slot = particle;
            }
            timings.record(Stage::Resolve, worker, begin.elapsed());
        });
    }

    /// Compact away every particle the policy's kill predicate rejects.
    ///
    /// Single-threaded maintenance pass; call between ticks. Returns the
    /// number of particles removed.
    pub fn remove_killed(&mut self) -> usize {
        let policy = &self.policy;
        let removed = self.store.retain_live(|p| !policy.should_kill(p));
        if removed > 0 {
            tracing::debug!(removed, "culled particles");
        }
        removed
    }

    /// Read-only snapshot of the resolved particle buffer.
    ///
    /// External collaborators (rendering, inspection) are readers only.
    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    /// Number of live particles.
    pub fn alive(&self) -> usize {
        self.store.alive()
    }

    /// Maximum number of particles.
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Number of particles queued for the next tick's drain.
    pub fn pending(&self) -> usize {
        self.store.pending()
    }

    /// Ticks stepped since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The engine's spatial grid.
    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    /// Per-species parameter table.
    pub fn species(&self) -> &[SpeciesData] {
        &self.species
    }

    /// The active policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Timings of the last tick's stages.
    pub fn timings(&self) -> &StageTimings {
        &self.timings
    }

    /// Whether the pipeline currently runs across the worker pool.
    pub fn multithreading(&self) -> bool {
        self.multithreading
    }

    /// Toggle the worker pool on or off at a tick boundary.
    ///
    /// The single-worker path runs the same code over the full index range
    /// and produces equivalent results (bit-identical up to floating-point
    /// reduction order in the collision sums).
    pub fn set_multithreading(&mut self, enabled: bool) {
        if self.multithreading == enabled {
            return;
        }
        self.multithreading = enabled;
        let workers = if enabled { self.threads } else { 1 };
        self.pool = WorkerPool::new(workers);
        self.timings = StageTimings::new(workers);
        tracing::debug!(workers, "worker pool resized");
    }
}

/// Resolve one particle against its 2x2x2 chunk neighborhood.
///
/// Depenetration pushes overlapping pairs apart to exactly `diameter`,
/// split evenly between the two; the partner applies its half independently
/// in its own pass, so no write to `sorted` is ever needed here.
#[allow(clippy::too_many_arguments)]
fn resolve_particle<P: InteractionPolicy>(
    particle: &mut Particle,
    index: usize,
    sorted: &[Particle],
    grid: &ChunkGrid,
    ledger: &ChunkLedger,
    diameter: f32,
    policy: &P,
    species: &[SpeciesData],
    social: &SocialMatrix,
) {
    let species_data = &species[particle.species as usize];

    let mut depenetration = Vec3::ZERO;
    let mut collisions = 0u32;
    let mut social_sum = Vec3::ZERO;
    let mut interactions = 0u32;

    let base = grid.half_cell_base(particle.position);
    // Four x-row pairs cover the 2x2x2 block around the nearest half-cell
    // boundary; x-adjacent chunks are contiguous in the sorted buffer.
    for (dy, dz) in [(0, 0), (1, 0), (1, 1), (0, 1)] {
        let row = grid.chunk_at_offset(base, 0, dy, dz);
        for i in ledger.row_span(row) {
            if i == index {
                continue;
            }
            let other = &sorted[i];
            let d = particle.position - other.position;
            let dist_sq = d.length_squared();
            if dist_sq < diameter * diameter && dist_sq > MIN_DISTANCE_SQ {
                let dist = dist_sq.sqrt();
                depenetration += d * (0.5 * (diameter - dist) / dist);
                collisions += 1;
            }
            if let Some(contribution) = policy.pairwise(
                particle,
                species_data,
                other,
                &species[other.species as usize],
                social.get(particle.species, other.species),
            ) {
                social_sum += contribution;
                interactions += 1;
            }
        }
    }

    if collisions > 0 {
        particle.position += depenetration / collisions as f32;
    }
    if interactions > 0 {
        particle.position += social_sum / interactions as f32;
    }

    // Constraint pass with doubled correction: the containment clamp and
    // the policy's constraints both land inside the reflection window, so
    // a boundary violation settles within a tick or two instead of
    // converging asymptotically.
    let unconstrained = particle.position;
    let bound = grid.containment_bound();
    particle.position = particle
        .position
        .clamp(Vec3::splat(-bound), Vec3::splat(bound));
    policy.constraints(particle, species_data);
    particle.position = unconstrained + 2.0 * (particle.position - unconstrained);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_engine(capacity: usize, side: usize) -> ParticleEngine<NullPolicy> {
        let params = EngineParams {
            max_particles: capacity,
            chunk_side: side,
            chunk_size: 0.1,
            particle_diameter: 0.05,
            threads: Some(4),
            ..EngineParams::default()
        };
        ParticleEngine::new(
            params,
            vec![SpeciesData::default()],
            SocialMatrix::new(1),
            NullPolicy,
        )
    }

    /// Emit `count` particles spread across the addressable volume.
    fn emit_spread(engine: &mut ParticleEngine<NullPolicy>, count: usize, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let bound = engine.grid().containment_bound();
        for _ in 0..count {
            let p = Vec3::new(
                rng.random_range(-bound..bound),
                rng.random_range(-bound..bound),
                rng.random_range(-bound..bound),
            );
            assert!(engine.try_emit(Particle::new(p, 0)));
        }
    }

    /// Run the pipeline up to (and including) the scatter, leaving the
    /// sorted back buffer and ledger in their post-sort state.
    fn run_through_scatter(engine: &mut ParticleEngine<NullPolicy>) {
        engine.timings.reset();
        engine.ledger.clear();
        engine.integrate();
        engine.store.drain_emissions(&engine.grid, &engine.ledger);
        engine.ledger.accumulate();
        engine.scatter();
    }

    #[test]
    fn sorted_buffer_partitions_by_chunk() {
        let mut engine = test_engine(256, 8);
        emit_spread(&mut engine, 200, 7);
        run_through_scatter(&mut engine);

        let grid = engine.grid;
        let sorted = engine.store.sorted();
        for chunk in 0..grid.num_chunks() {
            for i in engine.ledger.span(chunk) {
                assert_eq!(
                    grid.chunk_of(sorted[i].position),
                    chunk,
                    "particle {i} landed outside its chunk slice"
                );
            }
        }
    }

    #[test]
    fn scatter_is_a_permutation_of_the_live_slice() {
        let mut engine = test_engine(256, 8);
        emit_spread(&mut engine, 200, 11);
        run_through_scatter(&mut engine);

        let key = |p: &Particle| (p.position.x, p.position.y, p.position.z);
        let mut before: Vec<_> = engine.store.particles().iter().map(key).collect();
        let mut after: Vec<_> = engine.store.sorted().iter().map(key).collect();
        let order = |a: &(f32, f32, f32), b: &(f32, f32, f32)| {
            a.0.total_cmp(&b.0)
                .then(a.1.total_cmp(&b.1))
                .then(a.2.total_cmp(&b.2))
        };
        before.sort_by(order);
        after.sort_by(order);
        assert_eq!(before.len(), 200);
        assert_eq!(before, after, "scatter lost or duplicated particles");
    }

    #[test]
    fn histogram_total_matches_alive_count() {
        let mut engine = test_engine(256, 8);
        emit_spread(&mut engine, 150, 13);

        engine.ledger.clear();
        engine.integrate();
        engine.store.drain_emissions(&engine.grid, &engine.ledger);
        let total = engine.ledger.accumulate();
        assert_eq!(total, engine.alive());
        let last = engine.grid.num_chunks() - 1;
        assert_eq!(engine.ledger.end(last), engine.alive());
    }

    #[test]
    fn emission_with_unknown_species_is_rejected() {
        let mut engine = test_engine(16, 8);
        assert!(!engine.try_emit(Particle::new(Vec3::ZERO, 5)));
        assert_eq!(engine.pending(), 0);
    }

    #[test]
    fn step_counts_ticks_and_keeps_particles_finite() {
        let mut engine = test_engine(64, 8);
        emit_spread(&mut engine, 40, 17);
        for _ in 0..5 {
            engine.step();
        }
        assert_eq!(engine.ticks(), 5);
        assert_eq!(engine.alive(), 40);
        for p in engine.particles() {
            assert!(p.position.is_finite(), "non-finite position {}", p.position);
        }
    }
}
