//! Mining and placement rules.

use glam::Vec2;
use terralite_core::{Tile, Tool, TILE_SIZE, WORLD_HEIGHT};
use terralite_physics::{Aabb, Player};
use terralite_world::World;

/// Mining and placement reach, measured from the player centre.
pub const REACH: f32 = 5.0 * TILE_SIZE;

/// How long a tile takes to break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningProfile {
    /// Tool that speeds mining up, if any.
    pub best_tool: Option<Tool>,
    /// Seconds with the best tool held.
    pub with_tool: f32,
    /// Seconds otherwise.
    pub without_tool: f32,
}

impl MiningProfile {
    const fn flat(seconds: f32) -> Self {
        Self {
            best_tool: None,
            with_tool: seconds,
            without_tool: seconds,
        }
    }

    pub const fn for_tile(tile: Tile) -> Self {
        match tile {
            Tile::Dirt | Tile::Grass => Self {
                best_tool: Some(Tool::Shovel),
                with_tool: 0.20,
                without_tool: 1.20,
            },
            Tile::Stone => Self {
                best_tool: Some(Tool::Pickaxe),
                with_tool: 0.55,
                without_tool: 6.00,
            },
            Tile::Wood | Tile::Trunk => Self {
                best_tool: Some(Tool::Axe),
                with_tool: 0.50,
                without_tool: 2.00,
            },
            Tile::Leaves => Self::flat(0.05),
            Tile::Empty | Tile::Background => Self::flat(0.90),
        }
    }

    pub fn time(&self, tool: Option<Tool>) -> f32 {
        match (self.best_tool, tool) {
            (Some(best), Some(held)) if best == held => self.with_tool,
            _ => self.without_tool,
        }
    }
}

/// Seconds needed to break `tile` while holding `tool`.
pub fn break_time(tile: Tile, tool: Option<Tool>) -> f32 {
    MiningProfile::for_tile(tile).time(tool)
}

/// Item picked up when `tile` is broken.
pub fn drop_for(tile: Tile) -> Option<Tile> {
    match tile {
        Tile::Dirt | Tile::Grass => Some(Tile::Dirt),
        Tile::Stone => Some(Tile::Stone),
        Tile::Wood | Tile::Trunk => Some(Tile::Wood),
        Tile::Empty | Tile::Background | Tile::Leaves => None,
    }
}

/// Tile under a world-space aim point.
pub fn aim_tile(aim: Vec2) -> (i32, i32) {
    (
        (aim.x / TILE_SIZE).floor() as i32,
        (aim.y / TILE_SIZE).floor() as i32,
    )
}

/// Whether `aim` lies within [`REACH`] of the player's centre.
pub fn in_reach(player: &Player, aim: Vec2) -> bool {
    player.center().distance_squared(aim) <= REACH * REACH
}

/// Whether `tile` may be placed at `(tx, ty)`: inside the world, onto an
/// empty tile, and not overlapping the player.
pub fn can_place(world: &mut World, player: &Player, tx: i32, ty: i32) -> bool {
    if !(0..WORLD_HEIGHT).contains(&ty) {
        return false;
    }
    !Aabb::of_tile(tx, ty).intersects(&player.aabb()) && world.get(tx, ty) == Tile::Empty
}

/// A tile that finished breaking this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenTile {
    pub x: i32,
    pub y: i32,
    pub tile: Tile,
}

/// Progress on the tile currently being mined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningState {
    pub tx: i32,
    pub ty: i32,
    pub tile: Tile,
    pub elapsed: f32,
    pub required: f32,
}

impl MiningState {
    /// Completion in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.required <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.required).clamp(0.0, 1.0)
    }

    fn targets(&self, tx: i32, ty: i32, tile: Tile) -> bool {
        self.tx == tx && self.ty == ty && self.tile == tile
    }
}

/// Advance mining of `(tx, ty)` by `dt` seconds.
///
/// Switching target restarts progress at zero. The required time is re-read
/// every tick so changing tools mid-swing takes effect. On completion the
/// tile is cleared and returned.
pub fn mine(
    mining: &mut Option<MiningState>,
    world: &mut World,
    tx: i32,
    ty: i32,
    tool: Option<Tool>,
    dt: f32,
) -> Option<BrokenTile> {
    if !(0..WORLD_HEIGHT).contains(&ty) {
        return None;
    }
    let tile = world.get(tx, ty);
    if tile == Tile::Empty {
        *mining = None;
        return None;
    }
    let required = break_time(tile, tool);
    match mining.as_mut() {
        Some(state) if state.targets(tx, ty, tile) => {
            state.elapsed += dt;
            state.required = required;
        }
        _ => {
            *mining = Some(MiningState {
                tx,
                ty,
                tile,
                elapsed: 0.0,
                required,
            });
        }
    }
    if !mining.is_some_and(|state| state.elapsed >= state.required) {
        return None;
    }
    world.set(tx, ty, Tile::Empty);
    *mining = None;
    Some(BrokenTile { x: tx, y: ty, tile })
}
