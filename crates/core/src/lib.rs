#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod item;
pub mod tile;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

pub use item::{ItemKind, Tool};
pub use tile::{Tile, UnknownTileId};

/// Edge length of a square chunk, in tiles.
pub const CHUNK_SIZE: usize = 32;

/// Tile count of one chunk layer.
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Vertical extent of the world in tiles. Rows `[0, WORLD_HEIGHT)` exist.
pub const WORLD_HEIGHT: i32 = 200;

/// Number of chunk rows needed to cover [`WORLD_HEIGHT`].
pub const CHUNK_ROWS: i32 = (WORLD_HEIGHT + CHUNK_SIZE as i32 - 1) / CHUNK_SIZE as i32;

/// Edge length of one tile in world units.
pub const TILE_SIZE: f32 = 16.0;

/// Fixed tick type (60 TPS => ~16.7 ms per tick).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

/// Helper to derive a reproducible RNG seeded by world + purpose domains.
pub fn scoped_rng(world_seed: u64, domain: u64, tick: SimTick) -> StdRng {
    let seed = world_seed ^ domain.rotate_left(17) ^ tick.0;
    StdRng::seed_from_u64(seed)
}
