//! Global tile access over lazily generated chunks.

use std::collections::BTreeSet;

use terralite_core::{Tile, WORLD_HEIGHT};
use tracing::{debug, info};

use crate::chunk::{split_tile_coords, Chunk, ChunkPos};
use crate::generator::WorldGenerator;
use crate::storage::ChunkStorage;

/// The tile world of one session.
///
/// Any tile access inside the vertical extent creates and populates the owning
/// chunk on first touch. Rows outside `[0, WORLD_HEIGHT)` read as empty and
/// ignore writes without touching any chunk.
pub struct World {
    generator: WorldGenerator,
    chunks: ChunkStorage,
    /// Chunks with content not yet handed to the persistence store.
    changed: BTreeSet<ChunkPos>,
}

impl World {
    pub fn new(seed: u64) -> Self {
        info!(seed, "Creating world");
        Self {
            generator: WorldGenerator::new(seed),
            chunks: ChunkStorage::new(),
            changed: BTreeSet::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    /// Surface row of column `gx` for this world's seed.
    pub fn surface_height(&mut self, gx: i32) -> i32 {
        self.generator.surface_height(gx)
    }

    /// Chunk at `pos`, populated if this is its first access.
    ///
    /// Returns `None` for chunk rows outside the world.
    pub fn get_or_create_chunk(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        if !pos.in_world_rows() {
            return None;
        }
        let chunk = self.chunks.ensure_chunk(pos);
        if !chunk.is_generated() {
            self.generator.populate(chunk);
            self.changed.insert(pos);
        }
        Some(chunk)
    }

    /// Resident chunk at `pos`, without generating anything.
    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(pos)
    }

    /// Resident chunks in position order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.iter()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn tile_chunk(&mut self, x: i32, y: i32) -> Option<(&mut Chunk, usize, usize)> {
        if !(0..WORLD_HEIGHT).contains(&y) {
            return None;
        }
        let (pos, local) = split_tile_coords(x, y);
        let chunk = self.get_or_create_chunk(pos)?;
        Some((chunk, local.x, local.y))
    }

    /// Foreground tile at a global coordinate.
    pub fn get(&mut self, x: i32, y: i32) -> Tile {
        self.tile_chunk(x, y)
            .map_or(Tile::Empty, |(chunk, lx, ly)| chunk.tile(lx, ly))
    }

    /// Write a foreground tile. The chunk is marked dirty and changed.
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if let Some((chunk, lx, ly)) = self.tile_chunk(x, y) {
            chunk.set_tile(lx, ly, tile);
            chunk.mark_dirty();
            let pos = chunk.position();
            self.changed.insert(pos);
        }
    }

    /// Background tile at a global coordinate.
    pub fn get_bg(&mut self, x: i32, y: i32) -> Tile {
        self.tile_chunk(x, y)
            .map_or(Tile::Empty, |(chunk, lx, ly)| chunk.background(lx, ly))
    }

    /// Write a background tile. Same bookkeeping as [`World::set`].
    pub fn set_bg(&mut self, x: i32, y: i32, tile: Tile) {
        if let Some((chunk, lx, ly)) = self.tile_chunk(x, y) {
            chunk.set_background(lx, ly, tile);
            chunk.mark_dirty();
            let pos = chunk.position();
            self.changed.insert(pos);
        }
    }

    /// Whether the foreground tile at `(x, y)` blocks movement.
    pub fn is_solid(&mut self, x: i32, y: i32) -> bool {
        self.get(x, y).is_solid()
    }

    /// Chunks with unpersisted content, in position order.
    pub fn changed_chunks(&self) -> &BTreeSet<ChunkPos> {
        &self.changed
    }

    pub fn mark_changed(&mut self, pos: ChunkPos) {
        self.changed.insert(pos);
    }

    /// Forget the given positions once they are safely stored. Positions that
    /// were re-added after a snapshot are only cleared if listed.
    pub fn clear_changed<'a>(&mut self, positions: impl IntoIterator<Item = &'a ChunkPos>) {
        for pos in positions {
            self.changed.remove(pos);
        }
    }

    /// Hand out up to `budget` dirty chunks for redraw, clearing their flag.
    pub fn take_dirty_chunks(&mut self, budget: usize) -> Vec<ChunkPos> {
        let mut taken = Vec::new();
        for chunk in self.chunks.iter_mut() {
            if taken.len() >= budget {
                break;
            }
            if chunk.take_dirty() {
                taken.push(chunk.position());
            }
        }
        taken
    }

    /// Drop every chunk and switch to a new seed.
    pub fn reset(&mut self, seed: u64) {
        info!(seed, dropped = self.chunks.len(), "Resetting world");
        self.generator = WorldGenerator::new(seed);
        self.chunks.clear();
        self.changed.clear();
    }

    /// Install a chunk rebuilt from storage, replacing any resident one.
    ///
    /// Installed chunks are not added to the changed set; they already match
    /// what the store holds.
    pub fn install_chunk(&mut self, chunk: Chunk) {
        debug!(chunk_pos = ?chunk.position(), "Installing stored chunk");
        let mut chunk = chunk;
        chunk.mark_generated();
        self.chunks.insert(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_rows_are_empty_and_inert() {
        let mut world = World::new(1);
        assert_eq!(world.get(0, -1), Tile::Empty);
        assert_eq!(world.get(0, WORLD_HEIGHT), Tile::Empty);
        world.set(0, -5, Tile::Stone);
        world.set_bg(3, WORLD_HEIGHT + 2, Tile::Background);
        assert_eq!(world.chunk_count(), 0);
        assert!(world.changed_chunks().is_empty());
    }

    #[test]
    fn first_access_generates_chunk() {
        let mut world = World::new(42);
        let h = world.surface_height(0);
        assert!(world.get(0, h).is_solid());
        let pos = ChunkPos::containing(0, h);
        assert!(world.chunk(pos).is_some_and(Chunk::is_generated));
        assert!(world.changed_chunks().contains(&pos));
    }

    #[test]
    fn set_then_get_roundtrips_and_tracks_change() {
        let mut world = World::new(5);
        world.set(-40, 10, Tile::Wood);
        assert_eq!(world.get(-40, 10), Tile::Wood);
        let pos = ChunkPos::containing(-40, 10);
        assert!(world.changed_chunks().contains(&pos));
        world.clear_changed(&[pos]);
        assert!(world.changed_chunks().is_empty());
    }

    #[test]
    fn background_does_not_touch_foreground() {
        let mut world = World::new(5);
        world.set_bg(3, 3, Tile::Background);
        assert_eq!(world.get_bg(3, 3), Tile::Background);
        assert_eq!(world.get(3, 3), Tile::Empty);
    }

    #[test]
    fn redraw_budget_is_respected() {
        let mut world = World::new(8);
        for cx in 0..6 {
            world.get(cx * 32, 100);
        }
        assert_eq!(world.take_dirty_chunks(4).len(), 4);
        assert_eq!(world.take_dirty_chunks(4).len(), 2);
        assert!(world.take_dirty_chunks(4).is_empty());
    }

    #[test]
    fn reset_drops_everything() {
        let mut world = World::new(8);
        world.set(0, 0, Tile::Dirt);
        world.reset(9);
        assert_eq!(world.seed(), 9);
        assert_eq!(world.chunk_count(), 0);
        assert!(world.changed_chunks().is_empty());
    }

    #[test]
    fn installed_chunks_are_not_regenerated() {
        let mut world = World::new(8);
        let pos = ChunkPos::new(0, 0);
        let mut chunk = Chunk::new(pos);
        chunk.set_tile(0, 0, Tile::Stone);
        world.install_chunk(chunk);
        assert_eq!(world.get(0, 0), Tile::Stone);
        assert_eq!(world.get(1, 0), Tile::Empty);
        assert!(world.changed_chunks().is_empty());
    }
}
