//! Item system - tools and placeable tiles carried in the inventory.

use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stack limit for placeable items.
pub const MAX_STACK: u32 = 999;

/// Mining tools. Tools never stack and at most one of each is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Chops wood and trunks.
    Axe,
    /// Digs dirt and grass.
    Shovel,
    /// Breaks stone.
    Pickaxe,
}

impl Tool {
    /// All tools in hotbar order of the starter kit.
    pub const ALL: [Tool; 3] = [Tool::Pickaxe, Tool::Axe, Tool::Shovel];

    /// Lowercase persisted name.
    pub const fn name(self) -> &'static str {
        match self {
            Tool::Axe => "axe",
            Tool::Shovel => "shovel",
            Tool::Pickaxe => "pickaxe",
        }
    }

    /// Parse a persisted name. `"none"` and unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "axe" => Some(Tool::Axe),
            "shovel" => Some(Tool::Shovel),
            "pickaxe" => Some(Tool::Pickaxe),
            _ => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything an inventory slot can hold.
///
/// Serialized untagged so slots keep the compact persisted form: a numeric
/// tile id for placeable items and a tool name string for tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKind {
    /// A placeable tile.
    Tile(Tile),
    /// A mining tool.
    Tool(Tool),
}

impl ItemKind {
    /// Returns the tool, if this item is one.
    pub fn as_tool(self) -> Option<Tool> {
        match self {
            ItemKind::Tool(tool) => Some(tool),
            ItemKind::Tile(_) => None,
        }
    }

    /// Returns the placeable tile, if this item is one.
    pub fn as_tile(self) -> Option<Tile> {
        match self {
            ItemKind::Tile(tile) => Some(tile),
            ItemKind::Tool(_) => None,
        }
    }

    /// Whether several units share a slot.
    pub fn is_stackable(self) -> bool {
        matches!(self, ItemKind::Tile(_))
    }

    /// Maximum units per slot.
    pub fn max_stack(self) -> u32 {
        match self {
            ItemKind::Tile(_) => MAX_STACK,
            ItemKind::Tool(_) => 1,
        }
    }
}

impl From<Tile> for ItemKind {
    fn from(tile: Tile) -> Self {
        ItemKind::Tile(tile)
    }
}

impl From<Tool> for ItemKind {
    fn from(tool: Tool) -> Self {
        ItemKind::Tool(tool)
    }
}
