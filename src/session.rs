//! Simulation context owned by the embedding application.
//!
//! A [`Session`] holds every piece of mutable game state. The UI queues
//! [`Command`]s and passes a [`StepInput`] each tick; the session answers with
//! [`SessionEvent`]s and a [`SessionSnapshot`].

use std::collections::VecDeque;

use anyhow::Result;
use glam::Vec2;
use rand::{rngs::StdRng, Rng};
use terralite_core::{scoped_rng, ItemKind, SimTick, Tile, Tool};
use terralite_physics::{ControlInput, Player, PlayerController};
use terralite_world::{
    ChunkPos, Inventory, LeafDecay, PlayerPos, RestoredSession, SaveManager, SessionMeta,
    World, WorldStore,
};
use tracing::{debug, info, warn};

use crate::commands::{Command, MiningProgress, SessionEvent, SessionSnapshot, StepInput};
use crate::config::SessionConfig;
use crate::mining::{self, MiningState};

/// RNG domain of the periodic flush roll.
const FLUSH_RNG_DOMAIN: u64 = 0x464C_5553;

fn session_meta<'a>(
    player: &Player,
    tool: Option<Tool>,
    inventory: &'a Inventory,
) -> SessionMeta<'a> {
    SessionMeta {
        player: PlayerPos {
            x: player.pos.x,
            y: player.pos.y,
        },
        tool,
        inventory,
    }
}

pub struct Session {
    config: SessionConfig,
    world: World,
    player: Player,
    controller: PlayerController,
    inventory: Inventory,
    held_tool: Option<Tool>,
    decay: LeafDecay,
    saves: SaveManager,
    mining: Option<MiningState>,
    paused: bool,
    tick: SimTick,
    flush_rng: StdRng,
    commands: VecDeque<Command>,
    events: VecDeque<SessionEvent>,
}

impl Session {
    pub fn new(config: SessionConfig, store: Box<dyn WorldStore>) -> Self {
        let world = World::new(config.seed);
        let flush_rng = scoped_rng(config.seed, FLUSH_RNG_DOMAIN, SimTick::ZERO);
        let decay = LeafDecay::with_batch_budget(config.decay_batch_budget);
        Self {
            config,
            world,
            player: Player::new(Vec2::ZERO),
            controller: PlayerController::default(),
            inventory: Inventory::new(),
            held_tool: None,
            decay,
            saves: SaveManager::new(store),
            mining: None,
            paused: false,
            tick: SimTick::ZERO,
            flush_rng,
            commands: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    /// Restore the previous session from the store, or set up a fresh world.
    ///
    /// Returns whether a previous session was restored. A store that cannot
    /// be read is logged and treated as empty.
    pub fn start(&mut self) -> bool {
        let restored = match self.saves.restore(&mut self.world) {
            Ok(restored) => restored,
            Err(err) => {
                warn!(error = %err, "Failed to restore saved world, starting fresh");
                None
            }
        };
        let was_restored = restored.is_some();
        match restored {
            Some(restored) => self.apply_restored(restored),
            None => self.first_run(),
        }
        self.flush_rng = scoped_rng(self.world.seed(), FLUSH_RNG_DOMAIN, self.tick);
        info!(
            seed = self.world.seed(),
            restored = was_restored,
            "Session started"
        );
        was_restored
    }

    fn first_run(&mut self) {
        if self.config.starter_kit {
            for tool in Tool::ALL {
                self.inventory.add_item(tool.into(), 1);
            }
            self.inventory.add_item(Tile::Dirt.into(), 50);
            self.inventory.add_item(Tile::Wood.into(), 20);
        }
        self.player = Player::new(Vec2::ZERO);
        self.held_tool = self.inventory.held_tool();
    }

    fn apply_restored(&mut self, restored: RestoredSession) {
        self.player = Player::new(Vec2::new(restored.player.x, restored.player.y));
        self.inventory = restored.inventory;
        if let Some(tool) = restored.tool {
            self.select_tool(tool);
        }
        self.held_tool = self.inventory.held_tool();
        self.mining = None;
        self.decay = LeafDecay::with_batch_budget(self.config.decay_batch_budget);
        self.events
            .push_back(SessionEvent::player_restored(restored.player));
        self.events
            .push_back(SessionEvent::ToolRestored { tool: restored.tool });
    }

    /// Move the selection to the first slot holding `tool`, if any.
    fn select_tool(&mut self, tool: Tool) {
        if let Some(slot) = self.inventory.find(ItemKind::Tool(tool)) {
            self.inventory.select(slot);
        }
    }

    pub fn push_command(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// Apply every queued command without advancing the simulation.
    pub fn process_commands(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            self.apply_command(command);
        }
    }

    /// Advance the simulation by one step of `dt` seconds.
    ///
    /// Queued commands are applied first, even while paused.
    pub fn tick(&mut self, input: StepInput, dt: f32) {
        self.process_commands();
        if self.paused {
            return;
        }

        self.held_tool = self.inventory.held_tool();
        let control = ControlInput {
            left: input.left,
            right: input.right,
            jump: input.jump,
        };
        self.controller
            .update(&mut self.player, control, &mut self.world);
        self.handle_interactions(&input, dt);
        self.decay.update(f64::from(dt), &mut self.world);

        if self.flush_rng.gen::<f64>() < self.config.flush_chance {
            self.persist();
        }
        self.tick = self.tick.advance(1);
    }

    fn handle_interactions(&mut self, input: &StepInput, dt: f32) {
        let aim = input.aim();
        let reachable = mining::in_reach(&self.player, aim);
        let (tx, ty) = mining::aim_tile(aim);

        if reachable && input.primary {
            let broken = mining::mine(
                &mut self.mining,
                &mut self.world,
                tx,
                ty,
                self.held_tool,
                dt,
            );
            if let Some(broken) = broken {
                if let Some(drop) = mining::drop_for(broken.tile) {
                    self.inventory.add_item(drop.into(), 1);
                }
                if broken.tile == Tile::Trunk {
                    self.decay.on_trunk_broken(&mut self.world, tx, ty);
                }
                self.events.push_back(SessionEvent::TileBroken {
                    x: tx,
                    y: ty,
                    tile: broken.tile,
                });
            }
        } else if reachable && input.secondary {
            self.mining = None;
            let Some(tile) = self.inventory.selected_item().and_then(|s| s.item.as_tile()) else {
                return;
            };
            if mining::can_place(&mut self.world, &self.player, tx, ty)
                && self.inventory.consume_selected(1)
            {
                self.world.set(tx, ty, tile);
                self.events.push_back(SessionEvent::TilePlaced { x: tx, y: ty, tile });
            }
        } else {
            self.mining = None;
        }
    }

    fn apply_command(&mut self, command: Command) {
        debug!(?command, "Applying command");
        match command {
            Command::SelectSlot(slot) => self.inventory.select(slot),
            Command::StepSlot(delta) => self.inventory.step_selected(delta),
            Command::SelectTool(tool) => self.select_tool(tool),
            Command::SetPaused(paused) => {
                self.paused = paused;
                info!(paused, "Pause toggled");
            }
            Command::Save => self.persist(),
            Command::Export => {
                self.persist();
                let exported = self.saves.export_json(&self.world, self.meta());
                match exported {
                    Ok(json) => self.events.push_back(SessionEvent::Exported { json }),
                    Err(err) => warn!(error = %err, "Failed to export world"),
                }
            }
            Command::Import(json) => match self.saves.import_json(&mut self.world, &json) {
                Ok(restored) => {
                    self.apply_restored(restored);
                    info!(seed = self.world.seed(), "World imported");
                }
                Err(err) => {
                    warn!(error = %err, "Rejected world import");
                    self.events.push_back(SessionEvent::ImportFailed {
                        reason: err.to_string(),
                    });
                }
            },
        }
    }

    fn meta(&self) -> SessionMeta<'_> {
        session_meta(&self.player, self.held_tool, &self.inventory)
    }

    /// Best-effort flush of changed chunks and metadata.
    fn persist(&mut self) {
        match self.saves.flush_changed(&mut self.world) {
            Ok(chunks) => self.events.push_back(SessionEvent::Saved { chunks }),
            Err(err) => warn!(error = %err, "Failed to flush changed chunks"),
        }
        let meta = session_meta(&self.player, self.held_tool, &self.inventory);
        if let Err(err) = self.saves.save_meta(&self.world, meta) {
            warn!(error = %err, "Failed to save session metadata");
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tick: self.tick.0,
            x: self.player.pos.x,
            y: self.player.pos.y,
            vx: self.player.vel.x,
            vy: self.player.vel.y,
            on_ground: self.player.on_ground,
            tool: self.held_tool,
            selected_slot: self.inventory.selected(),
            mining: self.mining.map(|m| MiningProgress {
                x: m.tx,
                y: m.ty,
                progress: m.progress(),
            }),
            paused: self.paused,
        }
    }

    /// Hand up to `budget` chunks needing a redraw to the renderer.
    pub fn take_dirty_chunks(&mut self, budget: usize) -> Vec<ChunkPos> {
        self.world.take_dirty_chunks(budget)
    }

    /// Flush everything before the session is dropped.
    pub fn shutdown(&mut self) -> Result<()> {
        let chunks = self.saves.flush_changed(&mut self.world)?;
        let meta = session_meta(&self.player, self.held_tool, &self.inventory);
        self.saves.save_meta(&self.world, meta)?;
        info!(chunks, tick = self.tick.0, "Session shut down");
        Ok(())
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn leaf_decay(&self) -> &LeafDecay {
        &self.decay
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn current_tick(&self) -> SimTick {
        self.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
