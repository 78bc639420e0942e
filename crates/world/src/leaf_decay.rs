//! Cascading decay of leaves that lost their trunk.
//!
//! Candidate leaves wait in a pending set keyed by coordinate. Every update
//! advances a simulated clock and visits a bounded batch of entries in
//! round-robin order. A leaf with a trunk in reach is dropped from the set; an
//! unsupported leaf disappears once its own threshold has elapsed and wakes the
//! leaves around it.

use std::collections::BTreeMap;
use std::ops::Bound;

use terralite_core::Tile;
use tracing::debug;

use crate::world::World;

/// Pending entries visited per update.
pub const DECAY_BATCH_BUDGET: usize = 64;

/// A trunk within this many tiles (square) keeps a leaf alive.
pub const SUPPORT_RADIUS: i32 = 5;

/// Leaves scheduled around a broken trunk tile.
pub const TRUNK_BREAK_RADIUS: i32 = 6;

/// Leaves re-scheduled around a decayed leaf.
pub const CASCADE_RADIUS: i32 = 2;

const THRESHOLD_MIN: f64 = 0.6;
const THRESHOLD_SPAN: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingLeaf {
    started_at: f64,
    threshold: f64,
}

/// Seconds an unsupported leaf at `(x, y)` lasts, in `[0.6, 1.4]`.
///
/// Derived from the coordinate alone so decay timing is reproducible.
pub fn decay_threshold(x: i32, y: i32) -> f64 {
    let mixed = x.wrapping_mul(1_103_515_245) ^ y.wrapping_mul(12_345);
    let r = f64::from(mixed as u32) / f64::from(u32::MAX);
    THRESHOLD_MIN + r * THRESHOLD_SPAN
}

/// Outcome of one [`LeafDecay::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayStats {
    pub visited: usize,
    pub decayed: usize,
    pub supported: usize,
    pub vanished: usize,
}

/// Pending-set decay simulation.
#[derive(Debug, Clone)]
pub struct LeafDecay {
    pending: BTreeMap<(i32, i32), PendingLeaf>,
    clock: f64,
    cursor: Option<(i32, i32)>,
    batch_budget: usize,
}

impl Default for LeafDecay {
    fn default() -> Self {
        Self::new()
    }
}

impl LeafDecay {
    pub fn new() -> Self {
        Self::with_batch_budget(DECAY_BATCH_BUDGET)
    }

    pub fn with_batch_budget(batch_budget: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            clock: 0.0,
            cursor: None,
            batch_budget: batch_budget.max(1),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, x: i32, y: i32) -> bool {
        self.pending.contains_key(&(x, y))
    }

    /// Simulated seconds elapsed.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Add `(x, y)` to the pending set. An entry already waiting keeps its timer.
    pub fn schedule(&mut self, x: i32, y: i32) {
        let clock = self.clock;
        self.pending.entry((x, y)).or_insert_with(|| PendingLeaf {
            started_at: clock,
            threshold: decay_threshold(x, y),
        });
    }

    /// Schedule every leaf in the square of `radius` around `(x, y)`.
    pub fn schedule_around(&mut self, world: &mut World, x: i32, y: i32, radius: i32) {
        for ty in (y - radius)..=(y + radius) {
            for tx in (x - radius)..=(x + radius) {
                if world.get(tx, ty) == Tile::Leaves {
                    self.schedule(tx, ty);
                }
            }
        }
    }

    /// React to a trunk tile having been removed at `(x, y)`.
    pub fn on_trunk_broken(&mut self, world: &mut World, x: i32, y: i32) {
        self.schedule_around(world, x, y, TRUNK_BREAK_RADIUS);
        debug!(x, y, pending = self.pending.len(), "Trunk broken, leaves scheduled");
    }

    fn has_trunk_nearby(world: &mut World, x: i32, y: i32) -> bool {
        let r = SUPPORT_RADIUS;
        for ty in (y - r)..=(y + r) {
            for tx in (x - r)..=(x + r) {
                if world.get(tx, ty) == Tile::Trunk {
                    return true;
                }
            }
        }
        false
    }

    /// Next batch of keys, continuing after the cursor and wrapping around.
    fn next_batch(&self) -> Vec<(i32, i32)> {
        let budget = self.batch_budget.min(self.pending.len());
        let after = match self.cursor {
            Some(cursor) => self
                .pending
                .range((Bound::Excluded(cursor), Bound::Unbounded))
                .map(|(k, _)| *k)
                .take(budget)
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        let wrap = budget - after.len();
        let mut batch = after;
        let first = self.pending.keys().copied();
        match self.cursor {
            Some(cursor) => batch.extend(first.take_while(|k| *k <= cursor).take(wrap)),
            None => batch.extend(first.take(wrap)),
        }
        batch
    }

    /// Advance the clock by `dt` seconds and process one batch.
    pub fn update(&mut self, dt: f64, world: &mut World) -> DecayStats {
        self.clock += dt;
        let mut stats = DecayStats::default();
        if self.pending.is_empty() {
            self.cursor = None;
            return stats;
        }

        let batch = self.next_batch();
        for (x, y) in batch.iter().copied() {
            let Some(entry) = self.pending.get(&(x, y)).copied() else {
                continue;
            };
            stats.visited += 1;
            if world.get(x, y) != Tile::Leaves {
                self.pending.remove(&(x, y));
                stats.vanished += 1;
                continue;
            }
            if Self::has_trunk_nearby(world, x, y) {
                self.pending.remove(&(x, y));
                stats.supported += 1;
                continue;
            }
            if self.clock - entry.started_at >= entry.threshold {
                world.set(x, y, Tile::Empty);
                self.pending.remove(&(x, y));
                self.schedule_around(world, x, y, CASCADE_RADIUS);
                stats.decayed += 1;
            }
        }
        self.cursor = batch.last().copied();

        if stats.decayed > 0 {
            debug!(
                decayed = stats.decayed,
                pending = self.pending.len(),
                "Leaves decayed"
            );
        }
        stats
    }
}
