//! Tile kinds.
//!
//! Tiles are persisted as their `u16` id, so the discriminants below are part
//! of the save format and must never be renumbered.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a raw id does not name a known tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown tile id {0}")]
pub struct UnknownTileId(pub u16);

/// Every kind of tile the world can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum Tile {
    /// Nothing; the default for fresh storage.
    #[default]
    Empty = 0,
    /// Soil below the grass line.
    Dirt = 1,
    /// Deep rock.
    Stone = 2,
    /// Placed wooden planks.
    Wood = 3,
    /// Background filler behind terrain.
    Background = 4,
    /// Canopy foliage; decays without a nearby trunk.
    Leaves = 5,
    /// Natural tree trunk and branches.
    Trunk = 6,
    /// Topmost soil tile of a column.
    Grass = 7,
}

impl Tile {
    /// All tiles, ordered by id.
    pub const ALL: [Tile; 8] = [
        Tile::Empty,
        Tile::Dirt,
        Tile::Stone,
        Tile::Wood,
        Tile::Background,
        Tile::Leaves,
        Tile::Trunk,
        Tile::Grass,
    ];

    /// Raw persisted id.
    #[inline]
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Look up a tile by its persisted id.
    pub const fn from_id(id: u16) -> Result<Self, UnknownTileId> {
        match id {
            0 => Ok(Tile::Empty),
            1 => Ok(Tile::Dirt),
            2 => Ok(Tile::Stone),
            3 => Ok(Tile::Wood),
            4 => Ok(Tile::Background),
            5 => Ok(Tile::Leaves),
            6 => Ok(Tile::Trunk),
            7 => Ok(Tile::Grass),
            other => Err(UnknownTileId(other)),
        }
    }

    /// True for [`Tile::Empty`].
    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self, Tile::Empty)
    }

    /// Whether the player collides with this tile.
    ///
    /// Trunks and leaves are scenery the player walks through.
    pub const fn is_solid(self) -> bool {
        match self {
            Tile::Dirt | Tile::Stone | Tile::Wood | Tile::Grass => true,
            Tile::Empty | Tile::Background | Tile::Leaves | Tile::Trunk => false,
        }
    }

    /// Lowercase name used in logs and debug output.
    pub const fn name(self) -> &'static str {
        match self {
            Tile::Empty => "empty",
            Tile::Dirt => "dirt",
            Tile::Stone => "stone",
            Tile::Wood => "wood",
            Tile::Background => "background",
            Tile::Leaves => "leaves",
            Tile::Trunk => "trunk",
            Tile::Grass => "grass",
        }
    }
}

impl From<Tile> for u16 {
    fn from(tile: Tile) -> Self {
        tile.id()
    }
}

impl TryFrom<u16> for Tile {
    type Error = UnknownTileId;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Tile::from_id(id)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
