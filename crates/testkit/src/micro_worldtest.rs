//! Micro-worldtest harness for deterministic, tick-based replays.
//!
//! A micro-worldtest steps a small simulation for a fixed number of ticks and
//! captures a snapshot each tick. The recorded report can be compared against
//! a golden file, or the same script can be replayed twice from scratch to
//! check that both runs produce identical canonical JSON.

use crate::snapshot::{assert_json_snapshot, canonical_json, first_difference};
use anyhow::{bail, Result};
use serde::Serialize;
use std::path::PathBuf;
use terralite_core::SimTick;
use tracing::debug;

/// Configuration for a micro-worldtest.
#[derive(Debug, Clone)]
pub struct MicroWorldtestConfig {
    /// Human-readable name (written into the report).
    pub name: String,
    /// Number of ticks to step (report includes the initial snapshot at tick 0).
    pub ticks: u64,
    /// Optional golden JSON file to compare against.
    pub snapshot_path: Option<PathBuf>,
}

impl MicroWorldtestConfig {
    /// Config without a golden file.
    pub fn new(name: impl Into<String>, ticks: u64) -> Self {
        Self {
            name: name.into(),
            ticks,
            snapshot_path: None,
        }
    }
}

/// Single snapshot frame captured at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestFrame<S> {
    /// Tick number.
    pub tick: u64,
    /// Snapshot payload.
    pub snapshot: S,
}

/// Every frame of one run.
#[derive(Debug, Clone, Serialize)]
pub struct MicroWorldtestReport<S> {
    /// Name from the config.
    pub name: String,
    /// `ticks + 1` frames, starting at tick 0.
    pub frames: Vec<MicroWorldtestFrame<S>>,
}

/// Step `state` for `config.ticks` ticks and collect the frames.
pub fn record_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: &MicroWorldtestConfig,
    mut state: State,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> MicroWorldtestReport<Snapshot>
where
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let mut frames = Vec::with_capacity(config.ticks as usize + 1);

    let mut tick = SimTick::ZERO;
    frames.push(MicroWorldtestFrame {
        tick: tick.0,
        snapshot: snapshot(tick, &state),
    });

    for _ in 0..config.ticks {
        step(tick, &mut state);
        tick = tick.advance(1);
        frames.push(MicroWorldtestFrame {
            tick: tick.0,
            snapshot: snapshot(tick, &state),
        });
    }

    MicroWorldtestReport {
        name: config.name.clone(),
        frames,
    }
}

/// Run a micro-worldtest and assert the golden file, if one is configured.
pub fn run_micro_worldtest<State, Snapshot, StepFn, SnapFn>(
    config: MicroWorldtestConfig,
    state: State,
    step: StepFn,
    snapshot: SnapFn,
) -> Result<MicroWorldtestReport<Snapshot>>
where
    Snapshot: Serialize,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let report = record_micro_worldtest(&config, state, step, snapshot);
    if let Some(path) = &config.snapshot_path {
        assert_json_snapshot(path, &report)?;
    }
    Ok(report)
}

/// Run the same script twice from fresh state and require identical output.
///
/// Returns the canonical JSON of the (shared) report.
pub fn assert_deterministic_replay<State, Snapshot, InitFn, StepFn, SnapFn>(
    config: &MicroWorldtestConfig,
    mut init: InitFn,
    mut step: StepFn,
    mut snapshot: SnapFn,
) -> Result<String>
where
    Snapshot: Serialize,
    InitFn: FnMut() -> State,
    StepFn: FnMut(SimTick, &mut State),
    SnapFn: FnMut(SimTick, &State) -> Snapshot,
{
    let first = record_micro_worldtest(config, init(), &mut step, &mut snapshot);
    let second = record_micro_worldtest(config, init(), &mut step, &mut snapshot);
    let a = canonical_json(&first)?;
    let b = canonical_json(&second)?;
    if let Some(line) = first_difference(&a, &b) {
        bail!(
            "Replay '{}' diverged between runs at report line {}",
            config.name,
            line
        );
    }
    debug!(name = %config.name, frames = first.frames.len(), "Replay deterministic");
    Ok(a)
}
