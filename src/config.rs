use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/session.toml";

/// Tunables for one play session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    pub seed: u64,
    /// Directory holding `chunks.rg` and `meta.json`. `None` keeps saves in memory.
    pub save_dir: Option<PathBuf>,
    /// Simulation steps per second.
    pub step_rate: u32,
    /// Longest frame delta fed to the fixed-step loop, in milliseconds.
    pub max_frame_delta_ms: u32,
    /// Per-tick chance of a background flush.
    pub flush_chance: f64,
    pub decay_batch_budget: usize,
    /// Dirty chunks handed to the renderer per frame.
    pub redraw_budget: usize,
    /// Give the starter tools and blocks on a fresh world.
    pub starter_kit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            save_dir: Some(PathBuf::from("saves/world")),
            step_rate: 60,
            max_frame_delta_ms: 100,
            flush_chance: 0.02,
            decay_batch_budget: terralite_world::DECAY_BATCH_BUDGET,
            redraw_budget: 4,
            starter_kit: true,
        }
    }
}

impl SessionConfig {
    /// Load session configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SessionConfig>(&contents) {
                Ok(cfg) => cfg.sanitized(),
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SessionConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Session config not found at {}. Using defaults",
                        path.display()
                    );
                }
                SessionConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Clamp values a hand-edited file could get wrong.
    fn sanitized(mut self) -> Self {
        self.step_rate = self.step_rate.clamp(1, 1000);
        self.max_frame_delta_ms = self.max_frame_delta_ms.max(1);
        self.flush_chance = if self.flush_chance.is_finite() {
            self.flush_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.decay_batch_budget = self.decay_batch_budget.max(1);
        self
    }
}
