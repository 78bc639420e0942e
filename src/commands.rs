//! Inbound intents and outbound notifications of a [`Session`](crate::session::Session).

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use terralite_core::{Tile, Tool};
use terralite_world::PlayerPos;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

/// Intent queued by the UI layer and applied at the start of the next tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectSlot(usize),
    StepSlot(i32),
    /// Jump to the slot holding this tool, if any.
    SelectTool(Tool),
    SetPaused(bool),
    /// Flush changed chunks and metadata.
    Save,
    /// Flush, then emit the world as a JSON bundle.
    Export,
    /// Replace the world with a JSON bundle.
    Import(String),
}

/// Per-tick player input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepInput {
    pub left: bool,
    pub right: bool,
    /// Jump edge: true only on the tick the key went down.
    pub jump: bool,
    /// Cursor position in world units.
    pub aim: [f32; 2],
    /// Mine while held.
    pub primary: bool,
    /// Place the selected block while held.
    pub secondary: bool,
}

impl StepInput {
    pub fn aim(&self) -> Vec2 {
        Vec2::from(self.aim)
    }
}

/// Notification for the UI and render layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    PlayerRestored { x: f32, y: f32 },
    ToolRestored { tool: Option<Tool> },
    Exported { json: String },
    ImportFailed { reason: String },
    Saved { chunks: usize },
    TileBroken { x: i32, y: i32, tile: Tile },
    TilePlaced { x: i32, y: i32, tile: Tile },
}

impl SessionEvent {
    pub fn player_restored(pos: PlayerPos) -> Self {
        Self::PlayerRestored { x: pos.x, y: pos.y }
    }

    /// Short label used in event logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlayerRestored { .. } => "player_restored",
            Self::ToolRestored { .. } => "tool_restored",
            Self::Exported { .. } => "exported",
            Self::ImportFailed { .. } => "import_failed",
            Self::Saved { .. } => "saved",
            Self::TileBroken { .. } => "tile_broken",
            Self::TilePlaced { .. } => "tile_placed",
        }
    }
}

/// Read-only view of the simulation after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub tick: u64,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
    pub tool: Option<Tool>,
    pub selected_slot: usize,
    /// Tile being mined and its completion in `[0, 1]`.
    pub mining: Option<MiningProgress>,
    pub paused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MiningProgress {
    pub x: i32,
    pub y: i32,
    pub progress: f32,
}

/// Parse a slash command from a script or console.
///
/// `/import` is not accepted here since it needs file contents; the caller
/// reads the file and queues [`Command::Import`] itself.
pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let mut parts = trimmed.split_whitespace();
    let Some(name) = parts.next() else {
        return Err(CommandError::new("Empty command"));
    };
    let args: Vec<&str> = parts.collect();
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(CommandError::new(format!(
                "/{name} takes {n} argument(s), got {}",
                args.len()
            )))
        }
    };

    match name.to_ascii_lowercase().as_str() {
        "slot" | "select" => {
            arity(1)?;
            let slot = args[0]
                .parse::<usize>()
                .map_err(|_| CommandError::new(format!("Invalid slot '{}'", args[0])))?;
            Ok(Command::SelectSlot(slot))
        }
        "step" => {
            arity(1)?;
            let delta = args[0]
                .parse::<i32>()
                .map_err(|_| CommandError::new(format!("Invalid step '{}'", args[0])))?;
            Ok(Command::StepSlot(delta))
        }
        "tool" => {
            arity(1)?;
            Tool::from_name(args[0])
                .map(Command::SelectTool)
                .ok_or_else(|| CommandError::new(format!("Unknown tool '{}'", args[0])))
        }
        "pause" => match args.as_slice() {
            [] | ["on"] | ["true"] => Ok(Command::SetPaused(true)),
            ["off"] | ["false"] => Ok(Command::SetPaused(false)),
            _ => Err(CommandError::new("Usage: /pause [on|off]")),
        },
        "resume" => {
            arity(0)?;
            Ok(Command::SetPaused(false))
        }
        "save" => {
            arity(0)?;
            Ok(Command::Save)
        }
        "export" => {
            arity(0)?;
            Ok(Command::Export)
        }
        other => Err(CommandError::new(format!("Unknown command '/{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slot_commands() {
        assert_eq!(parse_command("/slot 3"), Ok(Command::SelectSlot(3)));
        assert_eq!(parse_command("step -1"), Ok(Command::StepSlot(-1)));
        assert_eq!(parse_command("/tool axe"), Ok(Command::SelectTool(Tool::Axe)));
    }

    #[test]
    fn parses_pause_variants() {
        assert_eq!(parse_command("/pause"), Ok(Command::SetPaused(true)));
        assert_eq!(parse_command("/pause off"), Ok(Command::SetPaused(false)));
        assert_eq!(parse_command("/resume"), Ok(Command::SetPaused(false)));
        assert!(parse_command("/pause maybe").is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("").is_err());
        assert!(parse_command("/slot").is_err());
        assert!(parse_command("/slot x").is_err());
        assert!(parse_command("/tool spoon").is_err());
        assert!(parse_command("/import world.json").is_err());
        assert!(parse_command("/save now").is_err());
    }

    #[test]
    fn event_kinds_match_serialized_tag() {
        let event = SessionEvent::TileBroken {
            x: 1,
            y: 2,
            tile: Tile::Stone,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], event.kind());
        assert_eq!(json["tile"], 2);
    }
}
