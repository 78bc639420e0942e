use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path};
use terralite_core::SimTick;

use crate::commands::{parse_command, Command};

#[derive(Debug, Deserialize)]
struct CommandScriptFile {
    steps: Vec<CommandScriptStepDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommandScriptStepDef {
    tick: u64,
    command: String,
}

#[derive(Debug, Clone)]
struct CommandScriptStep {
    tick: SimTick,
    command: Command,
}

/// Deterministic command script runner.
///
/// Scripts are a simple list of `{tick, command}` steps, executed in file order.
/// Commands are parsed up front so a typo fails the run before it starts.
#[derive(Debug)]
pub struct CommandScriptPlayer {
    pending: VecDeque<CommandScriptStep>,
}

impl CommandScriptPlayer {
    /// Load a command script from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read command script {}", path.display()))?;
        Self::from_str(&contents)
    }

    /// Load a command script from an in-memory JSON string.
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: CommandScriptFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("command script contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        let mut last_tick: Option<u64> = None;
        for (i, step) in file.steps.into_iter().enumerate() {
            if let Some(prev) = last_tick {
                if step.tick < prev {
                    anyhow::bail!("command script steps must be sorted by tick");
                }
            }
            last_tick = Some(step.tick);

            let command = parse_command(&step.command)
                .with_context(|| format!("command script step {i}"))?;
            pending.push_back(CommandScriptStep {
                tick: SimTick(step.tick),
                command,
            });
        }

        Ok(Self { pending })
    }

    /// Drain and return all commands scheduled for ticks `<= tick`.
    pub fn drain_ready_commands(&mut self, tick: SimTick) -> Vec<Command> {
        let mut commands = Vec::new();
        while self.pending.front().is_some_and(|step| step.tick <= tick) {
            if let Some(step) = self.pending.pop_front() {
                commands.push(step.command);
            }
        }
        commands
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terralite_core::Tool;

    #[test]
    fn command_script_rejects_unsorted_ticks() {
        let json = r#"{
            "steps": [
                {"tick": 2, "command": "/slot 1"},
                {"tick": 1, "command": "/slot 2"}
            ]
        }"#;
        let err = CommandScriptPlayer::from_str(json).unwrap_err();
        assert!(
            err.to_string().contains("sorted by tick"),
            "unexpected error: {err:#}"
        );
    }

    #[test]
    fn command_script_rejects_unknown_commands() {
        let json = r#"{"steps": [{"tick": 0, "command": "/fly"}]}"#;
        let err = CommandScriptPlayer::from_str(json).unwrap_err();
        assert!(format!("{err:#}").contains("Unknown command"));
    }

    #[test]
    fn command_script_drains_in_order_and_is_deterministic() {
        let json = r#"{
            "steps": [
                {"tick": 1, "command": "/tool axe"},
                {"tick": 1, "command": "/pause"},
                {"tick": 3, "command": "/save"}
            ]
        }"#;
        let mut script = CommandScriptPlayer::from_str(json).expect("script should parse");

        assert_eq!(script.drain_ready_commands(SimTick(0)), Vec::<Command>::new());
        assert_eq!(
            script.drain_ready_commands(SimTick(1)),
            vec![Command::SelectTool(Tool::Axe), Command::SetPaused(true)]
        );
        assert_eq!(script.drain_ready_commands(SimTick(2)), Vec::<Command>::new());
        assert_eq!(script.drain_ready_commands(SimTick(3)), vec![Command::Save]);
        assert!(script.is_finished());
    }
}
