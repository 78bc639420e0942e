#![warn(missing_docs)]
//! Physics primitives (AABB, tile collision, player movement).

mod controller;
mod player;

pub use controller::{ControlInput, PlayerController};
pub use player::{Player, PLAYER_HEIGHT, PLAYER_WIDTH};

use glam::Vec2;
use terralite_core::TILE_SIZE;
use terralite_world::World;

/// Shrink applied to box extents before mapping them to tiles, so a box that
/// ends exactly on a tile boundary does not count as touching the next tile.
pub const EDGE_EPSILON: f32 = 1e-3;

/// Axis-aligned bounding box in world units (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y);
        Self { min, max }
    }

    /// Box with its top-left corner at `pos`.
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos, pos + size)
    }

    /// Tests overlap with positive area; touching edges do not count.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Box covering the tile at `(tx, ty)`.
    pub fn of_tile(tx: i32, ty: i32) -> Self {
        let min = Vec2::new(tx as f32, ty as f32) * TILE_SIZE;
        Self::new(min, min + Vec2::splat(TILE_SIZE))
    }

    /// Inclusive tile range `(x0, y0, x1, y1)` this box occupies.
    pub fn tile_span(&self) -> (i32, i32, i32, i32) {
        let tile = |v: f32| (v / TILE_SIZE).floor() as i32;
        (
            tile(self.min.x),
            tile(self.min.y),
            tile(self.max.x - EDGE_EPSILON),
            tile(self.max.y - EDGE_EPSILON),
        )
    }
}

/// Anything collision can query for solid tiles.
pub trait TileSource {
    /// Whether the tile at `(tx, ty)` blocks movement.
    fn is_solid_tile(&mut self, tx: i32, ty: i32) -> bool;
}

impl TileSource for World {
    fn is_solid_tile(&mut self, tx: i32, ty: i32) -> bool {
        self.is_solid(tx, ty)
    }
}
