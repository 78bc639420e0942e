use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::{Chunk, ChunkPos};

/// In-memory chunk arena.
/// Uses BTreeMap for deterministic iteration order (exports, flushes and
/// redraw batches all walk chunks sorted by position).
///
/// Chunks are never evicted: the world keeps everything it has touched until
/// it is cleared or replaced by an import.
#[derive(Default)]
pub struct ChunkStorage {
    chunks: BTreeMap<ChunkPos, Chunk>,
}

impl ChunkStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true when no chunks are currently stored.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Obtain mutable access to a chunk, allocating an ungenerated one if necessary.
    pub fn ensure_chunk(&mut self, pos: ChunkPos) -> &mut Chunk {
        self.chunks.entry(pos).or_insert_with(|| Chunk::new(pos))
    }

    /// Insert a fully built chunk, replacing any resident one at the same position.
    pub fn insert(&mut self, chunk: Chunk) -> Option<Chunk> {
        match self.chunks.entry(chunk.position()) {
            Entry::Occupied(mut slot) => Some(std::mem::replace(slot.get_mut(), chunk)),
            Entry::Vacant(slot) => {
                slot.insert(chunk);
                None
            }
        }
    }

    /// Attempt to fetch a chunk immutably.
    pub fn get(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    /// Fetch a chunk mutably (without creating it).
    pub fn get_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos)
    }

    /// Iterate over currently resident chunk positions.
    pub fn iter_positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// Iterate over resident chunks in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.values()
    }

    /// Iterate mutably over resident chunks in position order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Chunk> + '_ {
        self.chunks.values_mut()
    }

    /// Drop every resident chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
