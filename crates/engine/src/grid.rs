//! Uniform cubic grid mapping world positions to collision chunks.
//!
//! The grid is centered on the origin: a position is transformed to cell
//! space with `p / chunk_size + side / 2` per axis and linearized
//! x-fastest. Cell coordinates are clamped to the grid, so a position that
//! escaped the addressable volume maps to a border chunk instead of
//! indexing out of bounds; escaping at all is a logic defect the collision
//! stage's containment clamp is responsible for preventing.

use glam::Vec3;

/// Integer cell coordinates of a chunk.
///
/// Kept as signed values so neighbor offsets can be applied before
/// linearization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkIndex {
    /// Cell coordinate along x.
    pub x: i32,
    /// Cell coordinate along y.
    pub y: i32,
    /// Cell coordinate along z.
    pub z: i32,
}

/// Fixed-resolution cubic collision grid.
#[derive(Debug, Clone, Copy)]
pub struct ChunkGrid {
    side: usize,
    chunk_size: f32,
}

impl ChunkGrid {
    /// Create a grid with `side` cells per axis, each `chunk_size` wide.
    pub fn new(side: usize, chunk_size: f32) -> Self {
        assert!(side >= 4, "chunk_side must be at least 4, got {side}");
        assert!(
            chunk_size > 0.0,
            "chunk_size must be positive, got {chunk_size}"
        );
        Self { side, chunk_size }
    }

    /// Cells per axis.
    pub fn side(&self) -> usize {
        self.side
    }

    /// World-space edge length of one cell.
    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    /// Total number of chunks (`side^3`).
    pub fn num_chunks(&self) -> usize {
        self.side * self.side * self.side
    }

    /// Half-extent of the volume the collision stage clamps particles into,
    /// leaving a two-cell margin so every neighbor scan stays on the grid.
    pub fn containment_bound(&self) -> f32 {
        (self.side as f32 * 0.5 - 2.0) * self.chunk_size
    }

    /// Continuous cell-space coordinates of a position (before truncation).
    #[inline]
    pub fn cell_coords(&self, position: Vec3) -> Vec3 {
        position / self.chunk_size + Vec3::splat(self.side as f32 * 0.5)
    }

    /// Integer cell coordinates of a position, clamped to the grid.
    ///
    /// A position outside the addressable volume is a logic defect (the
    /// constraint stage failed to contain it); it maps to a border cell
    /// rather than indexing out of bounds, and debug builds log it.
    #[inline]
    pub fn index_of(&self, position: Vec3) -> ChunkIndex {
        let f = self.cell_coords(position);
        let side = self.side as f32;
        if cfg!(debug_assertions)
            && (f.x < 0.0 || f.y < 0.0 || f.z < 0.0 || f.x >= side || f.y >= side || f.z >= side)
        {
            tracing::warn!(%position, "position escaped the grid volume");
        }
        let max = self.side as i32 - 1;
        ChunkIndex {
            x: (f.x.floor() as i32).clamp(0, max),
            y: (f.y.floor() as i32).clamp(0, max),
            z: (f.z.floor() as i32).clamp(0, max),
        }
    }

    /// Linearized chunk id of a position, in `[0, num_chunks)`.
    #[inline]
    pub fn chunk_of(&self, position: Vec3) -> usize {
        self.linearize(self.index_of(position))
    }

    /// Linearize integer cell coordinates (x-fastest).
    #[inline]
    pub fn linearize(&self, index: ChunkIndex) -> usize {
        let side = self.side as i32;
        (index.x + index.y * side + index.z * side * side) as usize
    }

    /// Chunk id at an integer offset from `index`, without revalidating
    /// against the position. Callers keep the offset coordinates in range.
    #[inline]
    pub fn chunk_at_offset(&self, index: ChunkIndex, dx: i32, dy: i32, dz: i32) -> usize {
        self.linearize(ChunkIndex {
            x: index.x + dx,
            y: index.y + dy,
            z: index.z + dz,
        })
    }

    /// Base cell of the 2x2x2 neighborhood that covers every particle
    /// within one cell-width of `position`.
    ///
    /// Per axis, the base steps down one cell when the position sits in the
    /// lower half of its cell, so the 2x2x2 block spans the half-cell
    /// boundary nearest the particle. The base is clamped to
    /// `[0, side - 2]` so `base + 1` never leaves the grid.
    #[inline]
    pub fn half_cell_base(&self, position: Vec3) -> ChunkIndex {
        let f = self.cell_coords(position);
        let max = self.side as i32 - 2;
        let axis = |v: f32| -> i32 {
            let cell = v.floor();
            let base = cell as i32 + if v - cell < 0.5 { -1 } else { 0 };
            base.clamp(0, max)
        };
        ChunkIndex {
            x: axis(f.x),
            y: axis(f.y),
            z: axis(f.z),
        }
    }
}
