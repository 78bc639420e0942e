//! Tree generation for world decoration.
//!
//! A tree is grown once into a blueprint of tile writes (trunk, branches,
//! canopy) from its column's RNG stream, then stamped into whichever chunks it
//! overlaps. Stamping is non-destructive: a tile is only written where the
//! foreground is still empty, so the first writer wins.

use terralite_core::{Tile, CHUNK_SIZE, WORLD_HEIGHT};

use crate::chunk::Chunk;
use crate::rng::Mulberry32;

/// Furthest horizontal distance any tree tile can land from its root column.
///
/// Lean (2) plus the widest canopy half-width (5) stays well inside this.
pub const TREE_REACH: i32 = 10;

/// Tree species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    Oak,
    Pine,
    Birch,
}

impl Species {
    /// Pick a species, biased towards oaks in dense forest.
    pub fn pick(rng: &mut Mulberry32, density: f64) -> Self {
        let r = rng.next_f64() * 1.05 + (density + 1.0) * 0.1;
        if r < 0.35 {
            Species::Birch
        } else if r < 0.60 {
            Species::Pine
        } else {
            Species::Oak
        }
    }
}

/// Shape parameters of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub trunk_min: i32,
    pub trunk_max: i32,
    /// Total horizontal lean over the full trunk height, in tiles.
    pub lean_max: f64,
    pub trunk_width: i32,
    pub branch_count_min: i32,
    pub branch_count_max: i32,
    pub branch_len_min: i32,
    pub branch_len_max: i32,
    pub canopy_radius_min: i32,
    pub canopy_radius_max: i32,
    /// Probability that a tile inside the canopy ellipse gets a leaf.
    pub leaf_density: f64,
    /// Bare trunk kept leaf-free above the ground.
    pub bare_min: i32,
    pub bare_max: i32,
}

impl TreeParams {
    /// Parameters for `species`. Oaks roll for a double-width trunk.
    pub fn for_species(species: Species, rng: &mut Mulberry32) -> Self {
        match species {
            Species::Pine => Self {
                trunk_min: 8,
                trunk_max: 16,
                lean_max: 1.0,
                trunk_width: 1,
                branch_count_min: 3,
                branch_count_max: 6,
                branch_len_min: 2,
                branch_len_max: 4,
                canopy_radius_min: 2,
                canopy_radius_max: 3,
                leaf_density: 0.85,
                bare_min: 3,
                bare_max: 6,
            },
            Species::Birch => Self {
                trunk_min: 6,
                trunk_max: 12,
                lean_max: 1.5,
                trunk_width: 1,
                branch_count_min: 2,
                branch_count_max: 4,
                branch_len_min: 2,
                branch_len_max: 3,
                canopy_radius_min: 2,
                canopy_radius_max: 3,
                leaf_density: 0.75,
                bare_min: 2,
                bare_max: 5,
            },
            Species::Oak => Self {
                trunk_min: 7,
                trunk_max: 14,
                lean_max: 2.0,
                trunk_width: if rng.next_f64() < 0.2 { 2 } else { 1 },
                branch_count_min: 3,
                branch_count_max: 7,
                branch_len_min: 2,
                branch_len_max: 5,
                canopy_radius_min: 3,
                canopy_radius_max: 5,
                leaf_density: 0.9,
                bare_min: 3,
                bare_max: 6,
            },
        }
    }
}

/// Round to the nearest column, ties towards positive infinity.
///
/// A lean of -0.5 lands on column 0, not -1, so left and right leaning trees
/// share the same tie rule.
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// A single tile write of a tree blueprint, in global tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeTile {
    pub x: i32,
    pub y: i32,
    pub tile: Tile,
}

/// Blueprint of a grown tree.
#[derive(Debug, Clone)]
pub struct Tree {
    /// Root column.
    pub x: i32,
    /// Lowest trunk row (the first air row above the surface).
    pub root_y: i32,
    pub species: Species,
    pub height: i32,
    /// Trunk rows above the root kept free of leaves.
    pub bare_trunk: i32,
    tiles: Vec<TreeTile>,
}

impl Tree {
    /// Grow a tree rooted at `(gx, root_y)`, drawing every shape decision from
    /// `rng`.
    pub fn grow(gx: i32, root_y: i32, rng: &mut Mulberry32, density: f64) -> Self {
        let species = Species::pick(rng, density);
        let params = TreeParams::for_species(species, rng);
        let mut tiles = Vec::new();

        let height = rng.range_i32(params.trunk_min, params.trunk_max);
        let lean = (rng.next_f64() * 2.0 - 1.0) * params.lean_max;
        let bare_trunk = rng
            .range_i32(params.bare_min, params.bare_max)
            .min((height - 2).max(2))
            .max(2);

        // Trunk, bottom-up with a linear lean.
        for i in 0..height {
            let t = f64::from(i) / f64::from((height - 1).max(1));
            let offset = round_half_up(t * lean);
            let y = root_y - i;
            if y < 0 {
                break;
            }
            for w in 0..params.trunk_width {
                let side = if params.trunk_width == 2 && rng.coin() { -1 } else { 0 };
                tiles.push(TreeTile {
                    x: gx + offset + w + side,
                    y,
                    tile: Tile::Trunk,
                });
            }
        }

        // Branches, evenly spread along the upper trunk.
        let branch_count = rng.range_i32(params.branch_count_min, params.branch_count_max);
        let min_rel = (f64::from(bare_trunk) / f64::from(height.max(1)) + 0.05).max(0.35);
        for b in 0..branch_count {
            let rel = 0.35 + 0.55 * (f64::from(b) / f64::from((branch_count - 1).max(1)));
            if rel < min_rel {
                continue;
            }
            let by = root_y - (f64::from(height) * rel).floor() as i32;
            let dir = if rng.coin() { -1 } else { 1 };
            let len = rng.range_i32(params.branch_len_min, params.branch_len_max);
            let bx0 = gx + round_half_up(rel * lean);
            for k in 0..len {
                tiles.push(TreeTile {
                    x: bx0 + dir * k,
                    y: by - (f64::from(k) * 0.3).floor() as i32,
                    tile: Tile::Trunk,
                });
            }
        }

        // Canopy: a soft ellipse around the top, never below the bare zone.
        let top_y = root_y - (height - 1);
        let radius = f64::from(rng.range_i32(params.canopy_radius_min, params.canopy_radius_max));
        let rx = radius + if species == Species::Pine { -0.2 } else { 0.4 };
        let ry = match species {
            Species::Pine => radius * 1.3,
            Species::Birch => radius * 0.9,
            Species::Oak => radius,
        };
        let cx = gx + round_half_up(lean);
        let leaf_min_y = root_y - bare_trunk;
        let reach_y = ry.ceil() as i32 + 1;
        let reach_x = rx.ceil() as i32 + 1;
        for dy in -reach_y..=reach_y {
            for dx in -reach_x..=reach_x {
                let nx = f64::from(dx) / (rx + 0.0001);
                let ny = f64::from(dy) / (ry + 0.0001);
                let inside = nx * nx + ny * ny <= 0.95 + rng.next_f64() * 0.12;
                if !inside {
                    continue;
                }
                if rng.next_f64() > params.leaf_density {
                    continue;
                }
                let y = top_y + dy;
                if y > leaf_min_y {
                    continue;
                }
                tiles.push(TreeTile {
                    x: cx + dx,
                    y,
                    tile: Tile::Leaves,
                });
            }
        }

        Self {
            x: gx,
            root_y,
            species,
            height,
            bare_trunk,
            tiles,
        }
    }

    /// Every tile write, in placement order.
    pub fn tiles(&self) -> &[TreeTile] {
        &self.tiles
    }

    /// Write the part of the tree that falls inside `chunk`.
    ///
    /// Only empty foreground tiles are written. Returns how many tiles landed.
    pub fn stamp_into(&self, chunk: &mut Chunk) -> usize {
        let (ox, oy) = chunk.position().origin();
        let size = CHUNK_SIZE as i32;
        let mut placed = 0;
        for t in &self.tiles {
            if t.y < 0 || t.y >= WORLD_HEIGHT {
                continue;
            }
            let lx = t.x - ox;
            let ly = t.y - oy;
            if !(0..size).contains(&lx) || !(0..size).contains(&ly) {
                continue;
            }
            let (lx, ly) = (lx as usize, ly as usize);
            if chunk.tile(lx, ly) == Tile::Empty {
                chunk.set_tile(lx, ly, t.tile);
                placed += 1;
            }
        }
        placed
    }
}
