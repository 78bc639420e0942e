//! Persistence round-trip worldtest.
//!
//! Focus areas:
//! - Chunk file format integrity (header, CRC, compression)
//! - Save manager flush / restore cycles through a real directory
//! - Export bundle fidelity

use std::env;
use std::fs;
use std::path::PathBuf;

use terralite_core::{ItemKind, Tile, Tool};
use terralite_world::{
    ChunkPos, ChunkRecord, FileStore, ImportError, Inventory, PlayerPos, SaveManager,
    SessionMeta, World, WorldStore,
};

const WORLD_SEED: u64 = 55_667_788;

fn temp_dir(label: &str) -> PathBuf {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    env::temp_dir().join(format!("terralite_{label}_{timestamp}"))
}

fn starter_inventory() -> Inventory {
    let mut inv = Inventory::new();
    inv.add_item(ItemKind::Tool(Tool::Pickaxe), 1);
    inv.add_item(ItemKind::Tile(Tile::Dirt), 50);
    inv.select(1);
    inv
}

#[test]
fn file_store_roundtrips_records() {
    let dir = temp_dir("file_store");
    let mut world = World::new(WORLD_SEED);
    for cx in -2..=2 {
        world.get(cx * 32, 90);
    }
    let records: Vec<ChunkRecord> = world.chunks().map(ChunkRecord::from_chunk).collect();

    {
        let mut store = FileStore::open(&dir).unwrap();
        store.put_chunks(&records).unwrap();
    }
    let reopened = FileStore::open(&dir).unwrap();
    assert_eq!(reopened.dir(), dir.as_path());
    assert!(dir.join("chunks.rg").exists());
    let loaded = reopened.all_chunks().unwrap();
    assert_eq!(loaded, records);
    for record in &loaded {
        let chunk = record.decode().unwrap();
        let original = world.chunk(record.pos()).unwrap();
        assert_eq!(chunk.tiles(), original.tiles());
        assert_eq!(chunk.background_tiles(), original.background_tiles());
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn corrupted_chunk_file_is_detected() {
    let dir = temp_dir("corrupt");
    let mut world = World::new(WORLD_SEED);
    world.set(3, 80, Tile::Wood);
    {
        let mut store = FileStore::open(&dir).unwrap();
        let records: Vec<_> = world.chunks().map(ChunkRecord::from_chunk).collect();
        store.put_chunks(&records).unwrap();
    }

    let path = dir.join("chunks.rg");
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5A;
    fs::write(&path, &bytes).unwrap();

    let err = FileStore::open(&dir).err().expect("CRC mismatch must be reported");
    assert!(format!("{err:#}").contains("CRC32"), "unexpected error: {err:#}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn save_manager_restores_previous_session() {
    let dir = temp_dir("restore");
    let inventory = starter_inventory();
    let player = PlayerPos { x: 48.0, y: 1200.5 };

    {
        let mut world = World::new(WORLD_SEED);
        let mut saves = SaveManager::new(Box::new(FileStore::open(&dir).unwrap()));
        world.set(10, 60, Tile::Wood);
        world.set(-33, 95, Tile::Empty);
        let flushed = saves.flush_changed(&mut world).unwrap();
        assert_eq!(flushed, world.chunk_count());
        saves
            .save_meta(
                &world,
                SessionMeta {
                    player,
                    tool: Some(Tool::Pickaxe),
                    inventory: &inventory,
                },
            )
            .unwrap();
    }

    let mut world = World::new(1);
    let mut saves = SaveManager::new(Box::new(FileStore::open(&dir).unwrap()));
    let restored = saves.restore(&mut world).unwrap().expect("previous session");
    assert_eq!(world.seed(), WORLD_SEED);
    assert_eq!(world.get(10, 60), Tile::Wood);
    assert_eq!(world.get(-33, 95), Tile::Empty);
    assert_eq!(restored.player, player);
    assert_eq!(restored.tool, Some(Tool::Pickaxe));
    assert_eq!(restored.inventory, inventory);
    assert!(world.changed_chunks().is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn export_then_import_preserves_world() {
    let dir = temp_dir("export");
    let mut world = World::new(WORLD_SEED);
    let mut saves = SaveManager::new(Box::new(FileStore::open(&dir).unwrap()));
    let edits = [
        (0, 70, Tile::Wood),
        (5, 71, Tile::Dirt),
        (-100, 150, Tile::Empty),
        (64, 20, Tile::Stone),
    ];
    for (x, y, tile) in edits {
        world.set(x, y, tile);
    }
    let inventory = starter_inventory();
    let meta = SessionMeta {
        player: PlayerPos { x: -5.0, y: 7.0 },
        tool: None,
        inventory: &inventory,
    };
    let json = saves.export_json(&world, meta).unwrap();

    let mut target = World::new(123);
    target.set(0, 70, Tile::Stone);
    let restored = saves.import_json(&mut target, &json).unwrap();

    assert_eq!(target.seed(), WORLD_SEED);
    for (x, y, tile) in edits {
        assert_eq!(target.get(x, y), tile, "tile at ({x}, {y})");
    }
    assert_eq!(restored.player, PlayerPos { x: -5.0, y: 7.0 });
    assert_eq!(restored.inventory.selected(), 1);
    assert_eq!(restored.tool, None);

    let reopened = FileStore::open(&dir).unwrap();
    assert_eq!(reopened.all_chunks().unwrap().len(), world.chunk_count());
    assert_eq!(reopened.meta().unwrap().map(|m| m.seed), Some(WORLD_SEED));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn wrong_bundle_version_is_refused() {
    let mut world = World::new(WORLD_SEED);
    world.set(1, 1, Tile::Wood);
    let mut saves = SaveManager::new(Box::new(terralite_world::MemoryStore::new()));
    let inventory = Inventory::new();
    let json = saves
        .export_json(
            &world,
            SessionMeta {
                player: PlayerPos::default(),
                tool: None,
                inventory: &inventory,
            },
        )
        .unwrap();
    let json = json.replacen("\"version\": 1", "\"version\": 2", 1);

    let err = saves.import_json(&mut world, &json).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedVersion(2)));
    assert_eq!(world.get(1, 1), Tile::Wood);
    assert!(world.chunk(ChunkPos::new(0, 0)).is_some());
}
