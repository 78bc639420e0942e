//! Save orchestration: incremental flushes, metadata snapshots and portable
//! export bundles.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use terralite_core::Tool;
use thiserror::Error;
use tracing::{info, warn};

use crate::chunk::{Chunk, ChunkPos};
use crate::codec::CodecError;
use crate::inventory::{migrate_inventory, Inventory, InventoryError, SavedInventory};
use crate::persist::{deserialize_tool, ChunkRecord, MetaRecord, PlayerPos, WorldStore, META_KEY};
use crate::world::World;

/// Export bundle format version.
pub const BUNDLE_VERSION: u64 = 1;

/// A chunk inside an export bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleChunk {
    pub cx: i32,
    pub cy: i32,
    pub tiles: Vec<u16>,
    pub bg: Vec<u16>,
}

/// Self-contained world transfer format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub version: u64,
    pub seed: u64,
    pub player: PlayerPos,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_tool"
    )]
    pub tool: Option<Tool>,
    pub inventory: SavedInventory,
    pub chunks: Vec<BundleChunk>,
}

/// Reasons an import is refused. The world is untouched in every case.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("bundle is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("bundle has no version field")]
    MissingVersion,
    #[error("unsupported bundle version {0}, expected {}", BUNDLE_VERSION)]
    UnsupportedVersion(u64),
    #[error("chunk ({cx}, {cy}) is corrupt: {source}")]
    Chunk {
        cx: i32,
        cy: i32,
        #[source]
        source: CodecError,
    },
    #[error("inventory is invalid: {0}")]
    Inventory(#[from] InventoryError),
}

/// Session state the save manager snapshots alongside the world.
#[derive(Debug, Clone, Copy)]
pub struct SessionMeta<'a> {
    pub player: PlayerPos,
    pub tool: Option<Tool>,
    pub inventory: &'a Inventory,
}

/// Session state recovered by an import or a restore, for the caller to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredSession {
    pub player: PlayerPos,
    pub tool: Option<Tool>,
    pub inventory: Inventory,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: Option<serde_json::Value>,
}

/// Drives a [`WorldStore`] from world and session state.
pub struct SaveManager {
    store: Box<dyn WorldStore>,
}

impl SaveManager {
    pub fn new(store: Box<dyn WorldStore>) -> Self {
        Self { store }
    }

    /// Persist every chunk in the world's changed set.
    ///
    /// The changed set is snapshotted before writing and only the flushed
    /// positions are cleared afterwards. On error nothing is cleared.
    pub fn flush_changed(&mut self, world: &mut World) -> Result<usize> {
        let positions: Vec<ChunkPos> = world.changed_chunks().iter().copied().collect();
        if positions.is_empty() {
            return Ok(0);
        }
        let records: Vec<ChunkRecord> = positions
            .iter()
            .filter_map(|pos| world.chunk(*pos))
            .map(ChunkRecord::from_chunk)
            .collect();
        self.store.put_chunks(&records)?;
        world.clear_changed(&positions);
        info!(chunks = records.len(), "Flushed changed chunks");
        Ok(records.len())
    }

    /// Overwrite the metadata record with the current session state.
    pub fn save_meta(&mut self, world: &World, meta: SessionMeta<'_>) -> Result<()> {
        let record = MetaRecord {
            key: META_KEY.to_string(),
            seed: world.seed(),
            player: meta.player,
            tool: meta.tool,
            inventory: meta.inventory.to_saved(),
        };
        self.store.put_meta(&record)
    }

    /// Bundle every resident chunk and the session metadata.
    pub fn export_bundle(&self, world: &World, meta: SessionMeta<'_>) -> ExportBundle {
        let chunks = world
            .chunks()
            .map(|chunk| {
                let record = ChunkRecord::from_chunk(chunk);
                BundleChunk {
                    cx: record.cx,
                    cy: record.cy,
                    tiles: record.tiles,
                    bg: record.bg,
                }
            })
            .collect();
        ExportBundle {
            version: BUNDLE_VERSION,
            seed: world.seed(),
            player: meta.player,
            tool: meta.tool,
            inventory: meta.inventory.to_saved(),
            chunks,
        }
    }

    /// Export as pretty JSON.
    pub fn export_json(&self, world: &World, meta: SessionMeta<'_>) -> Result<String> {
        let bundle = self.export_bundle(world, meta);
        Ok(serde_json::to_string_pretty(&bundle)?)
    }

    /// Parse and version-check a bundle without touching any state.
    pub fn parse_bundle(json: &str) -> Result<ExportBundle, ImportError> {
        let probe: VersionProbe = serde_json::from_str(json)?;
        let version = probe.version.ok_or(ImportError::MissingVersion)?;
        match version.as_u64() {
            Some(BUNDLE_VERSION) => {}
            Some(other) => return Err(ImportError::UnsupportedVersion(other)),
            None => return Err(ImportError::MissingVersion),
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the world with the bundle's contents.
    ///
    /// Every chunk and the inventory are validated first, so a bad bundle
    /// leaves the world as it was. Store failures after that point are logged
    /// and do not undo the in-memory import.
    pub fn import_bundle(
        &mut self,
        world: &mut World,
        bundle: ExportBundle,
    ) -> Result<RestoredSession, ImportError> {
        if bundle.version != BUNDLE_VERSION {
            return Err(ImportError::UnsupportedVersion(bundle.version));
        }
        let chunks = bundle
            .chunks
            .iter()
            .map(|c| {
                ChunkRecord {
                    key: ChunkPos::new(c.cx, c.cy).into(),
                    cx: c.cx,
                    cy: c.cy,
                    tiles: c.tiles.clone(),
                    bg: c.bg.clone(),
                }
                .decode()
                .map_err(|source| ImportError::Chunk {
                    cx: c.cx,
                    cy: c.cy,
                    source,
                })
            })
            .collect::<Result<Vec<Chunk>, _>>()?;
        let inventory = migrate_inventory(&bundle.inventory)?;

        if let Err(err) = self.store.clear_chunks() {
            warn!(error = %err, "Failed to clear stored chunks before import");
        }
        world.reset(bundle.seed);
        let records: Vec<ChunkRecord> = chunks.iter().map(ChunkRecord::from_chunk).collect();
        for chunk in chunks {
            world.install_chunk(chunk);
        }
        if let Err(err) = self.store.put_chunks(&records) {
            warn!(error = %err, "Failed to persist imported chunks");
            for record in &records {
                world.mark_changed(record.pos());
            }
        }

        let restored = RestoredSession {
            player: bundle.player,
            tool: bundle.tool,
            inventory,
        };
        let meta = SessionMeta {
            player: restored.player,
            tool: restored.tool,
            inventory: &restored.inventory,
        };
        if let Err(err) = self.save_meta(world, meta) {
            warn!(error = %err, "Failed to persist imported metadata");
        }
        info!(seed = bundle.seed, chunks = records.len(), "Imported world bundle");
        Ok(restored)
    }

    /// Parse and import a JSON bundle.
    pub fn import_json(
        &mut self,
        world: &mut World,
        json: &str,
    ) -> Result<RestoredSession, ImportError> {
        let bundle = Self::parse_bundle(json)?;
        self.import_bundle(world, bundle)
    }

    /// Rehydrate the world from the store if it holds a previous session.
    ///
    /// Returns `None` when metadata or chunks are missing, leaving the world
    /// untouched so the caller can apply first-run defaults.
    pub fn restore(&mut self, world: &mut World) -> Result<Option<RestoredSession>> {
        let Some(meta) = self.store.meta()? else {
            return Ok(None);
        };
        let records = self.store.all_chunks()?;
        if records.is_empty() {
            return Ok(None);
        }
        let chunks = records
            .iter()
            .map(|r| {
                r.decode()
                    .map_err(|err| anyhow::anyhow!("stored chunk {} is corrupt: {err}", r.key))
            })
            .collect::<Result<Vec<_>>>()?;
        let inventory = migrate_inventory(&meta.inventory)?;

        world.reset(meta.seed);
        for chunk in chunks {
            world.install_chunk(chunk);
        }
        info!(seed = meta.seed, chunks = records.len(), "Restored world from store");
        Ok(Some(RestoredSession {
            player: meta.player,
            tool: meta.tool,
            inventory,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use terralite_core::{ItemKind, Tile};

    fn manager() -> (SaveManager, MemoryStore) {
        let store = MemoryStore::new();
        (SaveManager::new(Box::new(store.clone())), store)
    }

    fn meta(inventory: &Inventory) -> SessionMeta<'_> {
        SessionMeta {
            player: PlayerPos { x: 10.0, y: 20.0 },
            tool: Some(Tool::Axe),
            inventory,
        }
    }

    #[test]
    fn flush_clears_changed_set() {
        let (mut saves, store) = manager();
        let mut world = World::new(3);
        world.set(5, 5, Tile::Wood);
        let flushed = saves.flush_changed(&mut world).unwrap();
        assert_eq!(flushed, 1);
        assert!(world.changed_chunks().is_empty());
        assert!(store.contains(ChunkPos::new(0, 0)));
        assert_eq!(saves.flush_changed(&mut world).unwrap(), 0);
    }

    #[test]
    fn failed_flush_keeps_changed_set() {
        let (mut saves, store) = manager();
        let mut world = World::new(3);
        world.set(5, 5, Tile::Wood);
        store.set_fail_writes(true);
        assert!(saves.flush_changed(&mut world).is_err());
        assert_eq!(world.changed_chunks().len(), 1);

        store.set_fail_writes(false);
        assert_eq!(saves.flush_changed(&mut world).unwrap(), 1);
    }

    #[test]
    fn unsupported_version_is_rejected_before_parsing() {
        let err = SaveManager::parse_bundle(r#"{"version": 2, "garbage": true}"#).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedVersion(2)));
        let err = SaveManager::parse_bundle(r#"{"seed": 1}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingVersion));
        let err = SaveManager::parse_bundle("not json").unwrap_err();
        assert!(matches!(err, ImportError::Malformed(_)));
    }

    #[test]
    fn corrupt_chunk_leaves_world_untouched() {
        let (mut saves, _store) = manager();
        let mut world = World::new(3);
        world.set(1, 1, Tile::Stone);
        let inventory = Inventory::new();
        let mut bundle = saves.export_bundle(&world, meta(&inventory));
        bundle.seed = 99;
        bundle.chunks[0].tiles = vec![2, 5];
        let err = saves.import_bundle(&mut world, bundle).unwrap_err();
        assert!(matches!(err, ImportError::Chunk { cx: 0, cy: 0, .. }));
        assert_eq!(world.seed(), 3);
        assert_eq!(world.get(1, 1), Tile::Stone);
    }

    #[test]
    fn export_import_roundtrip() {
        let (mut saves, store) = manager();
        let mut world = World::new(11);
        world.set(-7, 40, Tile::Wood);
        world.set(70, 100, Tile::Empty);
        let mut inventory = Inventory::new();
        inventory.add_item(ItemKind::Tile(Tile::Dirt), 12);
        inventory.select(4);

        let json = saves.export_json(&world, meta(&inventory)).unwrap();
        let mut other = World::new(1);
        let restored = saves.import_json(&mut other, &json).unwrap();

        assert_eq!(other.seed(), 11);
        assert_eq!(other.get(-7, 40), Tile::Wood);
        assert_eq!(other.get(70, 100), Tile::Empty);
        assert_eq!(other.chunk_count(), world.chunk_count());
        assert_eq!(restored.inventory, inventory);
        assert_eq!(restored.player, PlayerPos { x: 10.0, y: 20.0 });
        assert_eq!(restored.tool, Some(Tool::Axe));
        assert_eq!(store.chunk_count(), world.chunk_count());
    }

    #[test]
    fn restore_needs_meta_and_chunks() {
        let (mut saves, _store) = manager();
        let mut world = World::new(4);
        assert!(saves.restore(&mut world).unwrap().is_none());

        let inventory = Inventory::new();
        saves.save_meta(&world, meta(&inventory)).unwrap();
        assert!(saves.restore(&mut world).unwrap().is_none());

        world.set(3, 3, Tile::Dirt);
        saves.flush_changed(&mut world).unwrap();
        let mut fresh = World::new(0);
        let restored = saves.restore(&mut fresh).unwrap().unwrap();
        assert_eq!(fresh.seed(), 4);
        assert_eq!(fresh.get(3, 3), Tile::Dirt);
        assert_eq!(restored.tool, Some(Tool::Axe));
    }
}
