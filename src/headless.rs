use crate::command_script::CommandScriptPlayer;
use crate::commands::{Command, SessionEvent, SessionSnapshot, StepInput};
use crate::config::SessionConfig;
use crate::fixed_step::FixedStepLoop;
use crate::scripted_input::ScriptedInputPlayer;
use crate::session::Session;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use terralite_testkit::{EventRecord, JsonlSink};
use terralite_world::{FileStore, MemoryStore, WorldStore};
use tracing::{info, warn};

pub struct HeadlessConfig {
    pub session: SessionConfig,
    pub no_save: bool,
    /// Frames to simulate, one fixed step each.
    pub ticks: u64,
    pub scripted_input: Option<PathBuf>,
    pub command_script: Option<PathBuf>,
    /// Bundle imported before the first tick.
    pub import: Option<PathBuf>,
    /// Bundle written after the last tick.
    pub export: Option<PathBuf>,
    /// JSONL log of every session event.
    pub event_log: Option<PathBuf>,
}

#[derive(Debug)]
pub struct HeadlessSummary {
    pub restored: bool,
    pub events: usize,
    pub snapshot: SessionSnapshot,
}

fn open_store(cfg: &HeadlessConfig) -> Result<Box<dyn WorldStore>> {
    match (&cfg.session.save_dir, cfg.no_save) {
        (Some(dir), false) => {
            let store = FileStore::open(dir)?;
            info!(dir = %store.dir().display(), "Using file store");
            Ok(Box::new(store))
        }
        _ => {
            info!("Saving disabled, using in-memory store");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

struct EventPump {
    sink: Option<JsonlSink>,
    count: usize,
    exported: Option<String>,
}

impl EventPump {
    fn pump(&mut self, session: &mut Session) -> Result<()> {
        for event in session.drain_events() {
            self.count += 1;
            let record = match &event {
                SessionEvent::Exported { json } => EventRecord::new(
                    session.current_tick(),
                    event.kind(),
                    &serde_json::json!({ "bytes": json.len() }),
                )?,
                SessionEvent::ImportFailed { reason } => {
                    warn!(%reason, "Import failed");
                    EventRecord::new(session.current_tick(), event.kind(), &event)?
                }
                _ => EventRecord::new(session.current_tick(), event.kind(), &event)?,
            };
            if let Some(sink) = self.sink.as_mut() {
                sink.write(&record)?;
            }
            if let SessionEvent::Exported { json } = event {
                self.exported = Some(json);
            }
        }
        Ok(())
    }
}

pub fn run(cfg: HeadlessConfig) -> Result<HeadlessSummary> {
    let store = open_store(&cfg)?;
    let mut inputs = cfg
        .scripted_input
        .as_deref()
        .map(ScriptedInputPlayer::from_path)
        .transpose()
        .context("Failed to load scripted input")?;
    let mut commands = cfg
        .command_script
        .as_deref()
        .map(CommandScriptPlayer::from_path)
        .transpose()?;
    let mut pump = EventPump {
        sink: cfg.event_log.as_ref().map(JsonlSink::create).transpose()?,
        count: 0,
        exported: None,
    };

    let mut fixed = FixedStepLoop::new(
        cfg.session.step_rate,
        Duration::from_millis(u64::from(cfg.session.max_frame_delta_ms)),
    );
    let frame = Duration::from_secs(1) / cfg.session.step_rate.max(1);
    let redraw_budget = cfg.session.redraw_budget;

    let mut session = Session::new(cfg.session, store);
    let restored = session.start();

    if let Some(path) = &cfg.import {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bundle {}", path.display()))?;
        session.push_command(Command::Import(json));
        session.process_commands();
    }
    pump.pump(&mut session)?;

    for _ in 0..cfg.ticks {
        fixed.run(frame, |dt| {
            if let Some(script) = commands.as_mut() {
                for command in script.drain_ready_commands(session.current_tick()) {
                    session.push_command(command);
                }
            }
            let input = match inputs.as_mut() {
                Some(script) => script.advance(dt, session.player().center()),
                None => StepInput::default(),
            };
            session.tick(input, dt);
        });
        session.take_dirty_chunks(redraw_budget);
        pump.pump(&mut session)?;
    }

    if let Some(path) = &cfg.export {
        session.push_command(Command::Export);
        session.process_commands();
        pump.pump(&mut session)?;
        let json = pump
            .exported
            .take()
            .context("Export produced no bundle")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write bundle {}", path.display()))?;
        info!(path = %path.display(), "World exported");
    }

    session.shutdown()?;
    pump.pump(&mut session)?;
    if let Some(sink) = pump.sink.as_mut() {
        sink.flush()?;
    }

    Ok(HeadlessSummary {
        restored,
        events: pump.count,
        snapshot: session.snapshot(),
    })
}
