use crate::commands::StepInput;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize)]
struct ScriptedInputFile {
    steps: Vec<ScriptedStep>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ScriptedStep {
    /// Seconds this step is held.
    duration: f32,
    #[serde(default)]
    left: bool,
    #[serde(default)]
    right: bool,
    /// Jump once when the step begins.
    #[serde(default)]
    jump: bool,
    /// Aim relative to the player centre, in tiles.
    #[serde(default)]
    aim: [f32; 2],
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    secondary: bool,
}

/// Replays timed input steps; the last step repeats once the script runs out.
pub struct ScriptedInputPlayer {
    steps: Vec<ScriptedStep>,
    index: usize,
    time_in_step: f32,
    step_started: bool,
}

impl ScriptedInputPlayer {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    pub fn from_str(contents: &str) -> anyhow::Result<Self> {
        let file: ScriptedInputFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("scripted input file contains no steps");
        }
        Ok(Self {
            steps: file.steps,
            index: 0,
            time_in_step: 0.0,
            step_started: false,
        })
    }

    /// Input for the next tick. `center` is the player centre in world units.
    pub fn advance(&mut self, dt: f32, center: glam::Vec2) -> StepInput {
        self.time_in_step += dt;
        while self.index < self.steps.len() && self.time_in_step > self.steps[self.index].duration
        {
            self.time_in_step -= self.steps[self.index].duration;
            if self.index + 1 < self.steps.len() {
                self.index += 1;
                self.step_started = false;
            } else {
                self.time_in_step = 0.0;
                break;
            }
        }

        let step = self.steps.get(self.index).cloned().unwrap_or_default();
        let first_tick = !self.step_started;
        self.step_started = true;
        step.into_input(first_tick, center)
    }

    pub fn is_finished(&self) -> bool {
        self.index + 1 >= self.steps.len()
    }
}

impl ScriptedStep {
    fn into_input(self, first_tick: bool, center: glam::Vec2) -> StepInput {
        let aim = center + glam::Vec2::from(self.aim) * terralite_core::TILE_SIZE;
        StepInput {
            left: self.left,
            right: self.right,
            jump: self.jump && first_tick,
            aim: aim.to_array(),
            primary: self.primary,
            secondary: self.secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn steps_advance_and_jump_is_an_edge() {
        let json = r#"{
            "steps": [
                {"duration": 0.05, "right": true, "jump": true},
                {"duration": 0.05, "aim": [1.0, 2.0], "primary": true}
            ]
        }"#;
        let mut script = ScriptedInputPlayer::from_str(json).unwrap();
        let dt = 1.0 / 60.0;
        let first = script.advance(dt, Vec2::ZERO);
        assert!(first.right && first.jump);
        let second = script.advance(dt, Vec2::ZERO);
        assert!(second.right && !second.jump);
        script.advance(dt, Vec2::ZERO);
        let later = script.advance(dt, Vec2::new(8.0, 0.0));
        assert!(later.primary && !later.right);
        assert_eq!(later.aim, [24.0, 32.0]);
        assert!(script.is_finished());
    }

    #[test]
    fn empty_script_is_rejected() {
        assert!(ScriptedInputPlayer::from_str(r#"{"steps": []}"#).is_err());
    }
}
