//! Player body and its tile-stepped collision sweep.

use glam::Vec2;
use terralite_core::{TILE_SIZE, WORLD_HEIGHT};

use crate::{Aabb, TileSource, EDGE_EPSILON};

/// Player box width in world units.
pub const PLAYER_WIDTH: f32 = 12.0;

/// Player box height in world units.
pub const PLAYER_HEIGHT: f32 = 24.0;

/// Longest distance moved before re-testing tiles.
const MAX_STEP: f32 = 1.0;

/// The player's kinematic state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    /// Top-left corner of the box, in world units.
    pub pos: Vec2,
    /// Velocity in world units per tick.
    pub vel: Vec2,
    /// Box extents.
    pub size: Vec2,
    /// Whether the player stands on a solid tile.
    pub on_ground: bool,
}

impl Player {
    /// A resting player with its top-left corner at `pos`.
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            on_ground: false,
        }
    }

    /// Current bounding box.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }

    /// Centre of the box.
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Whether any tile under the box is solid.
    pub fn overlaps_solid<T: TileSource + ?Sized>(&self, tiles: &mut T) -> bool {
        let (x0, y0, x1, y1) = self.aabb().tile_span();
        (y0..=y1).any(|ty| (x0..=x1).any(|tx| tiles.is_solid_tile(tx, ty)))
    }

    /// Whether moving one unit down would hit a solid tile.
    pub fn ground_probe<T: TileSource + ?Sized>(&self, tiles: &mut T) -> bool {
        let probe = Aabb::from_pos_size(self.pos + Vec2::Y, self.size);
        let (x0, _, x1, bottom) = probe.tile_span();
        (x0..=x1).any(|tx| tiles.is_solid_tile(tx, bottom))
    }

    /// Move by `(dx, dy)`: horizontal first, then vertical.
    ///
    /// Each axis advances at most one unit at a time and only the tiles newly
    /// entered on the leading edge are tested. A blocked axis snaps to contact
    /// and its velocity is zeroed. Grounding is re-derived whenever the player
    /// moves vertically. The vertical position is clamped to the world.
    pub fn collide<T: TileSource + ?Sized>(&mut self, tiles: &mut T, dx: f32, dy: f32) {
        if dx != 0.0 {
            self.sweep_x(tiles, dx);
        }
        if dy != 0.0 {
            self.sweep_y(tiles, dy);
        }
        let floor = WORLD_HEIGHT as f32 * TILE_SIZE - self.size.y;
        self.pos.y = self.pos.y.clamp(0.0, floor);
        if dy != 0.0 {
            self.on_ground = self.ground_probe(tiles);
        }
    }

    fn sweep_x<T: TileSource + ?Sized>(&mut self, tiles: &mut T, dx: f32) {
        let dir = dx.signum();
        let mut remaining = dx.abs();
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP);
            let test = Aabb::from_pos_size(Vec2::new(self.pos.x + dir * step, self.pos.y), self.size);
            let (x0, y0, x1, y1) = test.tile_span();
            let column = if dir > 0.0 { x1 } else { x0 };
            if (y0..=y1).any(|ty| tiles.is_solid_tile(column, ty)) {
                self.pos.x = if dir > 0.0 {
                    (column as f32 * TILE_SIZE - self.size.x).max(self.pos.x)
                } else {
                    ((column + 1) as f32 * TILE_SIZE).min(self.pos.x)
                };
                self.vel.x = 0.0;
                break;
            }
            self.pos.x = test.min.x;
            remaining -= step;
        }
    }

    fn sweep_y<T: TileSource + ?Sized>(&mut self, tiles: &mut T, dy: f32) {
        let dir = dy.signum();
        let mut remaining = dy.abs();
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP);
            let test = Aabb::from_pos_size(Vec2::new(self.pos.x, self.pos.y + dir * step), self.size);
            let (x0, y0, x1, y1) = test.tile_span();
            let row = if dir > 0.0 { y1 } else { y0 };
            if (x0..=x1).any(|tx| tiles.is_solid_tile(tx, row)) {
                self.pos.y = if dir > 0.0 {
                    (row as f32 * TILE_SIZE - self.size.y).max(self.pos.y)
                } else {
                    ((row + 1) as f32 * TILE_SIZE).min(self.pos.y)
                };
                self.vel.y = 0.0;
                break;
            }
            self.pos.y = test.min.y;
            remaining -= step;
        }
    }
}
