//! Per-chunk world population: terrain columns first, then trees.

use terralite_core::{CHUNK_SIZE, WORLD_HEIGHT};
use tracing::{debug, instrument};

use crate::chunk::Chunk;
use crate::noise::ValueNoise1D;
use crate::rng::Mulberry32;
use crate::terrain::{column_tiles, TerrainSampler};
use crate::trees::{Tree, TREE_REACH};

/// Seed mix for the forest density stream.
const FOREST_SEED_MIX: u32 = 0x9E37_79B9;

const BASE_TREE_CHANCE: f64 = 0.02;
const FOREST_TREE_CHANCE: f64 = 0.13;
const RIDGE_TREE_BONUS: f64 = 0.05;

/// Populates chunks for one world seed.
///
/// Output for a chunk depends only on `(seed, cx, cy)`; the noise caches it
/// carries are an optimisation and never change results.
pub struct WorldGenerator {
    seed: u64,
    terrain: TerrainSampler,
    forest: ValueNoise1D,
}

impl WorldGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            terrain: TerrainSampler::new(seed),
            forest: ValueNoise1D::new(seed as u32 ^ FOREST_SEED_MIX),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Surface row of column `gx`.
    pub fn surface_height(&mut self, gx: i32) -> i32 {
        self.terrain.surface_height(gx)
    }

    /// Forest density of column `gx` in `[-1, 1]`.
    pub fn forest_density(&mut self, gx: i32) -> f64 {
        self.forest.fractal(f64::from(gx), 4, 0.01, 1.0).clamp(-1.0, 1.0)
    }

    /// Chance that a tree roots in column `gx`.
    pub fn tree_chance(&mut self, gx: i32) -> f64 {
        let density = self.forest_density(gx);
        let mut p = BASE_TREE_CHANCE + FOREST_TREE_CHANCE * (density + 1.0) / 2.0;
        if self.terrain.is_ridge(gx) {
            p += RIDGE_TREE_BONUS;
        }
        p
    }

    /// The tree rooted in column `gx`, if the column spawns one.
    ///
    /// The same column stream decides the spawn and shapes the tree, so every
    /// chunk that overlaps the tree sees an identical blueprint.
    pub fn tree_at(&mut self, gx: i32) -> Option<Tree> {
        let chance = self.tree_chance(gx);
        let mut rng = Mulberry32::for_column(self.seed, gx);
        if rng.next_f64() >= chance {
            return None;
        }
        let root_y = self.surface_height(gx) - 1;
        let density = self.forest_density(gx);
        Some(Tree::grow(gx, root_y, &mut rng, density))
    }

    /// Write terrain and trees into a fresh chunk and mark it generated.
    ///
    /// Only empty tiles are written, so calling this on a chunk that already
    /// holds content never replaces it.
    #[instrument(skip(self, chunk), fields(chunk_pos = ?chunk.position(), world_seed = self.seed))]
    pub fn populate(&mut self, chunk: &mut Chunk) {
        debug!("Starting chunk population");
        let pos = chunk.position();
        let (x0, y0) = pos.origin();
        let size = CHUNK_SIZE as i32;

        for lx in 0..CHUNK_SIZE {
            let height = self.surface_height(x0 + lx as i32);
            for ly in 0..CHUNK_SIZE {
                let y = y0 + ly as i32;
                if !(0..WORLD_HEIGHT).contains(&y) {
                    continue;
                }
                let (fg, bg) = column_tiles(height, y);
                if chunk.tile(lx, ly).is_empty() {
                    chunk.set_tile(lx, ly, fg);
                }
                if chunk.background(lx, ly).is_empty() {
                    chunk.set_background(lx, ly, bg);
                }
            }
        }

        let mut trees = 0usize;
        let mut stamped = 0usize;
        for gx in (x0 - TREE_REACH)..(x0 + size + TREE_REACH) {
            if let Some(tree) = self.tree_at(gx) {
                let placed = tree.stamp_into(chunk);
                if placed > 0 {
                    trees += 1;
                    stamped += placed;
                }
            }
        }

        chunk.mark_generated();
        debug!(trees, stamped, "Chunk population complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkPos;
    use terralite_core::Tile;

    fn generate(seed: u64, pos: ChunkPos) -> Chunk {
        let mut generator = WorldGenerator::new(seed);
        let mut chunk = Chunk::new(pos);
        generator.populate(&mut chunk);
        chunk
    }

    #[test]
    fn populate_marks_generated() {
        let chunk = generate(1, ChunkPos::new(0, 2));
        assert!(chunk.is_generated());
        assert!(chunk.is_dirty());
    }

    #[test]
    fn tree_chance_is_bounded() {
        let mut generator = WorldGenerator::new(42);
        for gx in -1000..1000 {
            let p = generator.tree_chance(gx);
            assert!((0.02..=0.2 + 1e-9).contains(&p), "p={p} at gx={gx}");
        }
    }

    #[test]
    fn some_columns_grow_trees() {
        let mut generator = WorldGenerator::new(42);
        let count = (0..500).filter(|gx| generator.tree_at(*gx).is_some()).count();
        assert!(count > 0);
        assert!(count < 200);
    }

    #[test]
    fn tree_blueprints_are_stable() {
        let mut a = WorldGenerator::new(9);
        let mut b = WorldGenerator::new(9);
        for gx in (0..300).rev() {
            let ta = a.tree_at(gx).map(|t| t.tiles().to_vec());
            let tb = b.tree_at(gx).map(|t| t.tiles().to_vec());
            assert_eq!(ta, tb);
        }
    }

    #[test]
    fn surface_row_is_grass_or_tree() {
        let mut generator = WorldGenerator::new(42);
        for cy in 0..terralite_core::CHUNK_ROWS {
            let pos = ChunkPos::new(0, cy);
            let mut chunk = Chunk::new(pos);
            generator.populate(&mut chunk);
            for lx in 0..CHUNK_SIZE {
                let h = generator.surface_height(lx as i32);
                if ChunkPos::containing(lx as i32, h) == pos {
                    let ly = (h - pos.origin().1) as usize;
                    assert_eq!(chunk.tile(lx, ly), Tile::Grass);
                }
            }
        }
    }

    #[test]
    fn bottom_chunk_rows_below_world_stay_empty() {
        let chunk = generate(3, ChunkPos::new(0, 6));
        for ly in 8..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                assert_eq!(chunk.tile(lx, ly), Tile::Empty);
                assert_eq!(chunk.background(lx, ly), Tile::Empty);
            }
        }
        assert_eq!(chunk.tile(0, 7), Tile::Stone);
    }
}
