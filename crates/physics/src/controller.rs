//! Turns movement intent into velocity and resolves it against the world.

use crate::player::Player;
use crate::TileSource;

/// Movement intent for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlInput {
    /// Accelerate left.
    pub left: bool,
    /// Accelerate right.
    pub right: bool,
    /// Jump edge: true only on the tick the jump was pressed.
    pub jump: bool,
}

/// Per-tick movement tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerController {
    /// Horizontal speed added per tick while a direction is held.
    pub acceleration: f32,
    /// Horizontal velocity multiplier applied every tick.
    pub friction: f32,
    /// Horizontal speed cap.
    pub max_speed: f32,
    /// Vertical velocity set by a jump (negative is up).
    pub jump_velocity: f32,
    /// Vertical speed added per tick.
    pub gravity: f32,
    /// Fall speed cap.
    pub terminal_velocity: f32,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self {
            acceleration: 0.6,
            friction: 0.85,
            max_speed: 2.3,
            jump_velocity: -6.0,
            gravity: 0.35,
            terminal_velocity: 10.0,
        }
    }
}

impl PlayerController {
    /// Advance the player by one tick.
    pub fn update<T: TileSource + ?Sized>(
        &self,
        player: &mut Player,
        input: ControlInput,
        tiles: &mut T,
    ) {
        if input.left {
            player.vel.x -= self.acceleration;
        }
        if input.right {
            player.vel.x += self.acceleration;
        }
        player.vel.x = (player.vel.x * self.friction).clamp(-self.max_speed, self.max_speed);

        if input.jump && player.on_ground {
            player.vel.y = self.jump_velocity;
            player.on_ground = false;
        }

        player.vel.y = (player.vel.y + self.gravity).min(self.terminal_velocity);

        let (vx, vy) = (player.vel.x, player.vel.y);
        player.collide(tiles, vx, 0.0);
        player.collide(tiles, 0.0, vy);
    }
}
