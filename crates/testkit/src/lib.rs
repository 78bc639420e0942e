#![warn(missing_docs)]
//! Deterministic testing surfaces (event stream, canonical snapshots, replay checks).

mod micro_worldtest;
mod snapshot;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use terralite_core::SimTick;

pub use micro_worldtest::*;
pub use snapshot::*;

/// One line of a session event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Simulation tick when the event occurred.
    pub tick: SimTick,
    /// Short kind label, e.g. `tile_broken`.
    pub kind: String,
    /// Event-specific payload.
    pub payload: serde_json::Value,
}

impl EventRecord {
    /// Build a record from any serializable payload.
    pub fn new<T: Serialize>(tick: SimTick, kind: &str, payload: &T) -> Result<Self> {
        Ok(Self {
            tick,
            kind: kind.to_string(),
            payload: serde_json::to_value(payload).context("Failed to serialize event payload")?,
        })
    }
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    out: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().context("Failed to flush event log")
    }
}

/// Read back a log written by [`JsonlSink`].
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event log {}", path.display()))?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Malformed event on line {}", i + 1))
        })
        .collect()
}
