//! Double-buffered particle storage with a bounded emission queue.
//!
//! Both buffers are allocated at full capacity up front; `alive` tracks the
//! live prefix. Emission is the system's backpressure point: `try_emit`
//! rejects instead of blocking or growing, and queued particles are only
//! admitted by the single-threaded drain between the integration and
//! prefix-sum phases, so they land in the same histogram the sort uses.

use std::collections::VecDeque;

use crate::grid::ChunkGrid;
use crate::particle::Particle;
use crate::sort::ChunkLedger;

/// Owner of the front/back particle buffers, the alive count, and the
/// pending-emission queue.
#[derive(Debug)]
pub struct ParticleStore {
    front: Vec<Particle>,
    back: Vec<Particle>,
    alive: usize,
    pending: VecDeque<Particle>,
}

impl ParticleStore {
    /// Create a store holding at most `capacity` particles.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "particle capacity must be positive");
        Self {
            front: vec![Particle::default(); capacity],
            back: vec![Particle::default(); capacity],
            alive: 0,
            pending: VecDeque::new(),
        }
    }

    /// Maximum number of particles the store can hold.
    pub fn capacity(&self) -> usize {
        self.front.len()
    }

    /// Number of live particles.
    pub fn alive(&self) -> usize {
        self.alive
    }

    /// Number of particles queued for admission at the next drain.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a particle for admission at the next tick.
    ///
    /// Returns `false` (discarding nothing the caller did not hand over)
    /// when admitting the particle would exceed capacity.
    pub fn try_emit(&mut self, particle: Particle) -> bool {
        if self.pending.len() + self.alive >= self.capacity() {
            return false;
        }
        self.pending.push_back(particle);
        true
    }

    /// Admit every queued particle onto the tail of the live prefix.
    ///
    /// Single-threaded by design; runs strictly after the integration
    /// histogram pass and before the prefix sum, counting each admitted
    /// particle into the same histogram. Returns the number admitted.
    pub fn drain_emissions(&mut self, grid: &ChunkGrid, ledger: &ChunkLedger) -> usize {
        let admitted = self.pending.len();
        while let Some(particle) = self.pending.pop_front() {
            ledger.count_one(grid.chunk_of(particle.position));
            self.front[self.alive] = particle;
            self.alive += 1;
        }
        admitted
    }

    /// Read-only view of the live particles in the front buffer.
    pub fn particles(&self) -> &[Particle] {
        &self.front[..self.alive]
    }

    /// Mutable live prefix of the front buffer (integration's write set).
    pub(crate) fn front_live_mut(&mut self) -> &mut [Particle] {
        &mut self.front[..self.alive]
    }

    /// Live front prefix plus the back buffer as scatter destination.
    pub(crate) fn scatter_split(&mut self) -> (&[Particle], &mut [Particle]) {
        (&self.front[..self.alive], &mut self.back[..self.alive])
    }

    /// Mutable live front prefix plus the sorted back buffer as the
    /// collision stage's read set.
    pub(crate) fn resolve_split(&mut self) -> (&mut [Particle], &[Particle]) {
        (&mut self.front[..self.alive], &self.back[..self.alive])
    }

    /// Read-only view of the live prefix of the back (sorted) buffer.
    pub(crate) fn sorted(&self) -> &[Particle] {
        &self.back[..self.alive]
    }

    /// Compact the live prefix, dropping particles `keep` rejects.
    ///
    /// Single-threaded; must not run while a tick is in flight. Returns the
    /// number of particles removed.
    pub fn retain_live<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Particle) -> bool,
    {
        let mut kept = 0;
        for i in 0..self.alive {
            if keep(&self.front[i]) {
                self.front[kept] = self.front[i];
                kept += 1;
            }
        }
        let removed = self.alive - kept;
        self.alive = kept;
        removed
    }
}
