//! Player inventory with a fixed slot count and a versioned save form.
//!
//! The first [`HOTBAR_SLOTS`] slots form the hotbar; the selected slot always
//! points into it. Placeable tiles stack up to [`MAX_STACK`]; tools never stack
//! and at most one of each is carried.

use serde::{Deserialize, Serialize};
use terralite_core::item::MAX_STACK;
use terralite_core::{ItemKind, Tool};
use thiserror::Error;

/// Slots in the current inventory layout.
pub const INVENTORY_SLOTS: usize = 20;

/// Slots reachable through slot selection.
pub const HOTBAR_SLOTS: usize = 10;

/// Slot count of the version 1 layout.
pub const LEGACY_INVENTORY_SLOTS: usize = 10;

/// Current saved inventory schema version.
pub const INVENTORY_VERSION: u32 = 2;

/// A non-empty inventory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemKind,
    pub count: u32,
}

impl ItemStack {
    pub fn new(item: ItemKind, count: u32) -> Self {
        Self { item, count }
    }

    /// Room left before this stack is full.
    pub fn remaining_space(&self) -> u32 {
        self.item.max_stack().saturating_sub(self.count)
    }
}

/// Errors raised while loading a saved inventory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("unsupported inventory version {0}")]
    UnsupportedVersion(u32),
    #[error("inventory has {0} slots, more than its version allows")]
    TooManySlots(usize),
    #[error("slot {slot} holds {count} items, more than one stack allows")]
    InvalidStack { slot: usize, count: u32 },
}

/// Fixed-capacity player inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: [Option<ItemStack>; INVENTORY_SLOTS],
    selected: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    /// Create a new empty inventory.
    pub fn new() -> Self {
        Self {
            slots: [None; INVENTORY_SLOTS],
            selected: 0,
        }
    }

    /// Add items, returning how many did not fit.
    ///
    /// Stackable items top up existing stacks first, then fill empty slots in
    /// order. A tool already carried is ignored.
    pub fn add_item(&mut self, item: ItemKind, count: u32) -> u32 {
        if count == 0 {
            return 0;
        }
        if item.as_tool().is_some() {
            if self.find(item).is_some() {
                return 0;
            }
            return match self.slots.iter_mut().find(|s| s.is_none()) {
                Some(slot) => {
                    *slot = Some(ItemStack::new(item, 1));
                    0
                }
                None => count,
            };
        }

        let mut remaining = count;
        for stack in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if stack.item == item {
                let added = remaining.min(stack.remaining_space());
                stack.count += added;
                remaining -= added;
            }
        }
        for slot in self.slots.iter_mut() {
            if remaining == 0 {
                break;
            }
            if slot.is_none() {
                let added = remaining.min(item.max_stack());
                *slot = Some(ItemStack::new(item, added));
                remaining -= added;
            }
        }
        remaining
    }

    /// Take `n` items from the selected stack.
    ///
    /// Fails without change when the slot is empty or holds a tool. A short
    /// stack is refused outright instead of being drained to zero, so a
    /// `true` return always means exactly `n` items were taken. An emptied
    /// slot is cleared.
    pub fn consume_selected(&mut self, n: u32) -> bool {
        let slot = &mut self.slots[self.selected];
        let Some(stack) = slot.as_mut() else {
            return false;
        };
        if stack.item.as_tool().is_some() || stack.count < n {
            return false;
        }
        stack.count -= n;
        if stack.count == 0 {
            *slot = None;
        }
        true
    }

    /// Select a hotbar slot, clamped to the hotbar.
    pub fn select(&mut self, slot: usize) {
        self.selected = slot.min(HOTBAR_SLOTS - 1);
    }

    /// Move the selection by `delta`, wrapping around the hotbar.
    pub fn step_selected(&mut self, delta: i32) {
        let len = HOTBAR_SLOTS as i32;
        self.selected = (self.selected as i32 + delta).rem_euclid(len) as usize;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Stack in the selected slot.
    pub fn selected_item(&self) -> Option<ItemStack> {
        self.slots[self.selected]
    }

    /// Tool in the selected slot, if any.
    pub fn held_tool(&self) -> Option<Tool> {
        self.selected_item().and_then(|s| s.item.as_tool())
    }

    /// First slot holding `item`.
    pub fn find(&self, item: ItemKind) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.is_some_and(|s| s.item == item))
    }

    /// Total count of `item` across all slots.
    pub fn count_of(&self, item: ItemKind) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item == item)
            .map(|s| s.count)
            .sum()
    }

    pub fn get(&self, slot: usize) -> Option<ItemStack> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    /// Saved form at the current schema version.
    pub fn to_saved(&self) -> SavedInventory {
        SavedInventory {
            version: Some(INVENTORY_VERSION),
            selected_slot: self.selected,
            slots: self
                .slots
                .iter()
                .map(|slot| match slot {
                    Some(stack) => SavedSlot {
                        item: Some(stack.item),
                        count: stack.count,
                    },
                    None => SavedSlot::default(),
                })
                .collect(),
        }
    }
}

/// One saved slot. An empty slot has no item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSlot {
    pub item: Option<ItemKind>,
    #[serde(default)]
    pub count: u32,
}

/// Inventory as stored in metadata records and export bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInventory {
    /// Schema version. Absent in the oldest saves, which are version 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default)]
    pub selected_slot: usize,
    #[serde(default)]
    pub slots: Vec<SavedSlot>,
}

/// Load a saved inventory of any supported version.
///
/// Older layouts are padded with empty slots up to [`INVENTORY_SLOTS`]; slot
/// order is kept. Empty or zero-count slots load as empty.
pub fn migrate_inventory(saved: &SavedInventory) -> Result<Inventory, InventoryError> {
    let version = saved.version.unwrap_or(1);
    let capacity = match version {
        1 => LEGACY_INVENTORY_SLOTS,
        INVENTORY_VERSION => INVENTORY_SLOTS,
        other => return Err(InventoryError::UnsupportedVersion(other)),
    };
    if saved.slots.len() > capacity {
        return Err(InventoryError::TooManySlots(saved.slots.len()));
    }

    let mut inventory = Inventory::new();
    for (i, slot) in saved.slots.iter().enumerate() {
        let Some(item) = slot.item else {
            continue;
        };
        if slot.count == 0 {
            continue;
        }
        if slot.count > item.max_stack() && item.as_tool().is_none() {
            return Err(InventoryError::InvalidStack {
                slot: i,
                count: slot.count,
            });
        }
        let count = slot.count.min(item.max_stack());
        inventory.slots[i] = Some(ItemStack::new(item, count));
    }
    inventory.select(saved.selected_slot);
    Ok(inventory)
}
