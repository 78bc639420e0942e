use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use terralite_core::{Tile, CHUNK_AREA, CHUNK_ROWS, CHUNK_SIZE};

/// Chunk-local position (X, Y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: usize,
    pub y: usize,
}

impl LocalPos {
    /// Convert to a linear index within the row-major tile arrays.
    pub fn index(self) -> usize {
        debug_assert!(self.x < CHUNK_SIZE);
        debug_assert!(self.y < CHUNK_SIZE);
        self.y * CHUNK_SIZE + self.x
    }
}

/// Chunk coordinate (X, Y) in chunk space.
/// Implements Ord for deterministic iteration in BTreeMap/BTreeSet (sorts by x, then y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk owning the global tile `(tx, ty)`.
    pub fn containing(tx: i32, ty: i32) -> Self {
        let size = CHUNK_SIZE as i32;
        Self::new(tx.div_euclid(size), ty.div_euclid(size))
    }

    /// Global tile coordinate of the chunk's top-left tile.
    pub fn origin(self) -> (i32, i32) {
        let size = CHUNK_SIZE as i32;
        (self.x * size, self.y * size)
    }

    /// Whether this chunk row lies inside the vertical extent of the world.
    pub fn in_world_rows(self) -> bool {
        (0..CHUNK_ROWS).contains(&self.y)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Split a global tile coordinate into its chunk and chunk-local parts.
pub fn split_tile_coords(tx: i32, ty: i32) -> (ChunkPos, LocalPos) {
    let size = CHUNK_SIZE as i32;
    let pos = ChunkPos::containing(tx, ty);
    let local = LocalPos {
        x: tx.rem_euclid(size) as usize,
        y: ty.rem_euclid(size) as usize,
    };
    (pos, local)
}

/// Composite persistence key: both chunk coordinates packed into one `u64`.
///
/// Serialized as the `"cx,cy"` string used by saved chunk records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(u64);

impl ChunkKey {
    pub fn from_pos(pos: ChunkPos) -> Self {
        Self((u64::from(pos.x as u32) << 32) | u64::from(pos.y as u32))
    }

    pub fn pos(self) -> ChunkPos {
        ChunkPos::new((self.0 >> 32) as u32 as i32, self.0 as u32 as i32)
    }

    /// Raw packed value.
    pub fn packed(self) -> u64 {
        self.0
    }
}

impl From<ChunkPos> for ChunkKey {
    fn from(pos: ChunkPos) -> Self {
        Self::from_pos(pos)
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.pos();
        write!(f, "{},{}", pos.x, pos.y)
    }
}

/// Error parsing a `"cx,cy"` chunk key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chunk key {0:?}, expected \"cx,cy\"")]
pub struct ChunkKeyParseError(pub String);

impl FromStr for ChunkKey {
    type Err = ChunkKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ChunkKeyParseError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse::<i32>().map_err(|_| err())?;
        let y = y.trim().parse::<i32>().map_err(|_| err())?;
        Ok(Self::from_pos(ChunkPos::new(x, y)))
    }
}

impl Serialize for ChunkKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Lifecycle flags of a chunk.
    pub struct ChunkFlags: u8 {
        /// Terrain and trees have been written. Never cleared.
        const GENERATED = 0b0000_0001;
        /// Content changed since the renderer last consumed it.
        const DIRTY = 0b0000_0010;
    }
}

impl Default for ChunkFlags {
    fn default() -> Self {
        ChunkFlags::empty()
    }
}

/// Square grid of foreground and background tiles plus lifecycle flags.
#[derive(Debug, Clone)]
pub struct Chunk {
    position: ChunkPos,
    tiles: Vec<Tile>,
    background: Vec<Tile>,
    flags: ChunkFlags,
}

impl Chunk {
    /// Allocate a fresh, ungenerated chunk filled with empty tiles.
    pub fn new(position: ChunkPos) -> Self {
        Self {
            position,
            tiles: vec![Tile::Empty; CHUNK_AREA],
            background: vec![Tile::Empty; CHUNK_AREA],
            flags: ChunkFlags::DIRTY,
        }
    }

    /// Rebuild a chunk from stored layers. The result counts as generated and
    /// dirty so it is never populated again and gets redrawn.
    ///
    /// Both layers must hold exactly [`CHUNK_AREA`] tiles.
    pub fn from_layers(position: ChunkPos, tiles: Vec<Tile>, background: Vec<Tile>) -> Self {
        debug_assert_eq!(tiles.len(), CHUNK_AREA);
        debug_assert_eq!(background.len(), CHUNK_AREA);
        Self {
            position,
            tiles,
            background,
            flags: ChunkFlags::GENERATED | ChunkFlags::DIRTY,
        }
    }

    #[inline]
    pub fn position(&self) -> ChunkPos {
        self.position
    }

    fn index(x: usize, y: usize) -> usize {
        LocalPos { x, y }.index()
    }

    /// Foreground tile at a local coordinate.
    pub fn tile(&self, x: usize, y: usize) -> Tile {
        self.tiles[Self::index(x, y)]
    }

    /// Set a foreground tile, marking the chunk dirty when it changes.
    /// Returns whether the stored tile changed.
    pub fn set_tile(&mut self, x: usize, y: usize, tile: Tile) -> bool {
        let idx = Self::index(x, y);
        if self.tiles[idx] == tile {
            return false;
        }
        self.tiles[idx] = tile;
        self.flags.insert(ChunkFlags::DIRTY);
        true
    }

    /// Background tile at a local coordinate.
    pub fn background(&self, x: usize, y: usize) -> Tile {
        self.background[Self::index(x, y)]
    }

    /// Set a background tile, marking the chunk dirty when it changes.
    pub fn set_background(&mut self, x: usize, y: usize, tile: Tile) -> bool {
        let idx = Self::index(x, y);
        if self.background[idx] == tile {
            return false;
        }
        self.background[idx] = tile;
        self.flags.insert(ChunkFlags::DIRTY);
        true
    }

    /// Row-major foreground layer.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Row-major background layer.
    pub fn background_tiles(&self) -> &[Tile] {
        &self.background
    }

    pub fn flags(&self) -> ChunkFlags {
        self.flags
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        self.flags.contains(ChunkFlags::GENERATED)
    }

    /// Record that population ran. Irreversible.
    pub(crate) fn mark_generated(&mut self) {
        self.flags.insert(ChunkFlags::GENERATED | ChunkFlags::DIRTY);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(ChunkFlags::DIRTY)
    }

    pub fn mark_dirty(&mut self) {
        self.flags.insert(ChunkFlags::DIRTY);
    }

    /// Consume the dirty flag, returning whether it was set.
    pub fn take_dirty(&mut self) -> bool {
        let dirty = self.is_dirty();
        self.flags.remove(ChunkFlags::DIRTY);
        dirty
    }

    /// Count foreground tiles of the given kind.
    pub fn count(&self, tile: Tile) -> usize {
        self.tiles.iter().filter(|t| **t == tile).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_tile_marks_dirty() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        assert!(chunk.take_dirty());
        assert!(chunk.set_tile(1, 2, Tile::Stone));
        assert_eq!(chunk.tile(1, 2), Tile::Stone);
        assert!(chunk.take_dirty());
    }

    #[test]
    fn set_same_tile_is_not_dirty() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        chunk.take_dirty();
        assert!(!chunk.set_tile(0, 0, Tile::Empty));
        assert!(!chunk.take_dirty());
    }

    #[test]
    fn background_layer_is_independent() {
        let mut chunk = Chunk::new(ChunkPos::new(3, 1));
        chunk.set_background(4, 4, Tile::Background);
        assert_eq!(chunk.background(4, 4), Tile::Background);
        assert_eq!(chunk.tile(4, 4), Tile::Empty);
    }

    #[test]
    fn new_chunk_is_empty_and_ungenerated() {
        let chunk = Chunk::new(ChunkPos::new(0, 0));
        assert!(!chunk.is_generated());
        assert_eq!(chunk.count(Tile::Empty), CHUNK_AREA);
        assert!(chunk.background_tiles().iter().all(|t| t.is_empty()));
    }

    #[test]
    fn generated_flag_survives_dirty_consumption() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        chunk.mark_generated();
        chunk.take_dirty();
        assert!(chunk.is_generated());
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn from_layers_is_generated_and_dirty() {
        let chunk = Chunk::from_layers(
            ChunkPos::new(0, 2),
            vec![Tile::Dirt; CHUNK_AREA],
            vec![Tile::Background; CHUNK_AREA],
        );
        assert_eq!(chunk.flags(), ChunkFlags::GENERATED | ChunkFlags::DIRTY);
        assert_eq!(chunk.tile(31, 31), Tile::Dirt);
    }

    #[test]
    fn local_pos_index_is_row_major() {
        assert_eq!(LocalPos { x: 0, y: 0 }.index(), 0);
        assert_eq!(LocalPos { x: 31, y: 0 }.index(), 31);
        assert_eq!(LocalPos { x: 0, y: 1 }.index(), CHUNK_SIZE);
    }

    #[test]
    fn split_handles_negative_coordinates() {
        let (pos, local) = split_tile_coords(-1, 33);
        assert_eq!(pos, ChunkPos::new(-1, 1));
        assert_eq!(local, LocalPos { x: 31, y: 1 });

        let (pos, local) = split_tile_coords(-32, 0);
        assert_eq!(pos, ChunkPos::new(-1, 0));
        assert_eq!(local, LocalPos { x: 0, y: 0 });

        let (pos, local) = split_tile_coords(-33, 0);
        assert_eq!(pos, ChunkPos::new(-2, 0));
        assert_eq!(local, LocalPos { x: 31, y: 0 });
    }

    #[test]
    fn origin_and_containing_agree() {
        for (tx, ty) in [(0, 0), (31, 31), (32, 64), (-1, 5), (-100, 199)] {
            let pos = ChunkPos::containing(tx, ty);
            let (ox, oy) = pos.origin();
            assert!(ox <= tx && tx < ox + CHUNK_SIZE as i32);
            assert!(oy <= ty && ty < oy + CHUNK_SIZE as i32);
        }
    }

    #[test]
    fn world_rows_are_bounded() {
        assert!(ChunkPos::new(0, 0).in_world_rows());
        assert!(ChunkPos::new(-9, 6).in_world_rows());
        assert!(!ChunkPos::new(0, 7).in_world_rows());
        assert!(!ChunkPos::new(0, -1).in_world_rows());
    }

    #[test]
    fn chunk_key_packs_and_unpacks() {
        for pos in [
            ChunkPos::new(0, 0),
            ChunkPos::new(-1, 6),
            ChunkPos::new(i32::MIN, i32::MAX),
        ] {
            assert_eq!(ChunkKey::from_pos(pos).pos(), pos);
        }
    }

    #[test]
    fn chunk_key_uses_comma_string_form() {
        let key = ChunkKey::from_pos(ChunkPos::new(-4, 2));
        assert_eq!(key.to_string(), "-4,2");
        assert_eq!("-4,2".parse::<ChunkKey>(), Ok(key));
        assert!("nope".parse::<ChunkKey>().is_err());
        assert!("1,".parse::<ChunkKey>().is_err());

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"-4,2\"");
        let back: ChunkKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn chunk_pos_ordering() {
        let a = ChunkPos::new(0, 0);
        let b = ChunkPos::new(1, 0);
        let c = ChunkPos::new(0, 1);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }

    #[test]
    fn chunk_pos_display() {
        assert_eq!(format!("{}", ChunkPos::new(5, -3)), "(5, -3)");
    }
}
