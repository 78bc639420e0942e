//! Durable storage of chunk records and session metadata.
//!
//! Chunks live in a single `chunks.rg` file: a small header (magic, version,
//! CRC32, payload length) followed by a zstd-compressed bincode map of every
//! record. Metadata is a pretty-printed `meta.json`. Files are always written
//! to a temporary sibling and renamed into place, so a batch either fully lands
//! or leaves the previous file untouched.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use crc32fast::Hasher;
use serde::{Deserialize, Deserializer, Serialize};
use terralite_core::Tool;
use tracing::debug;

use crate::chunk::{Chunk, ChunkKey, ChunkPos};
use crate::codec::{rle_decode, rle_encode, CodecError};
use crate::inventory::SavedInventory;

/// Magic number for chunk file identification ("TLRG").
const CHUNK_FILE_MAGIC: u32 = 0x544C_5247;

/// Current chunk file format version.
const CHUNK_FILE_VERSION: u16 = 1;

const HEADER_LEN: usize = 14;

const CHUNK_FILE: &str = "chunks.rg";
const META_FILE: &str = "meta.json";

/// Key of the single metadata record.
pub const META_KEY: &str = "main";

/// One persisted chunk: both layers run-length encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub key: ChunkKey,
    pub cx: i32,
    pub cy: i32,
    pub tiles: Vec<u16>,
    pub bg: Vec<u16>,
}

impl ChunkRecord {
    pub fn from_chunk(chunk: &Chunk) -> Self {
        let pos = chunk.position();
        Self {
            key: ChunkKey::from_pos(pos),
            cx: pos.x,
            cy: pos.y,
            tiles: rle_encode(chunk.tiles()),
            bg: rle_encode(chunk.background_tiles()),
        }
    }

    pub fn pos(&self) -> ChunkPos {
        ChunkPos::new(self.cx, self.cy)
    }

    /// Rebuild the chunk, marked generated and dirty.
    pub fn decode(&self) -> Result<Chunk, CodecError> {
        let tiles = rle_decode(&self.tiles)?;
        let bg = rle_decode(&self.bg)?;
        Ok(Chunk::from_layers(self.pos(), tiles, bg))
    }
}

/// Player position in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerPos {
    pub x: f32,
    pub y: f32,
}

/// Session metadata stored next to the chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRecord {
    #[serde(default = "default_meta_key")]
    pub key: String,
    pub seed: u64,
    pub player: PlayerPos,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_tool"
    )]
    pub tool: Option<Tool>,
    #[serde(default)]
    pub inventory: SavedInventory,
}

fn default_meta_key() -> String {
    META_KEY.to_string()
}

/// Accepts a tool name, `"none"`, an unknown name or `null`; the last three
/// load as no tool.
pub(crate) fn deserialize_tool<'de, D>(deserializer: D) -> Result<Option<Tool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Tool::from_name))
}

/// Key/value persistence of chunk records and the metadata record.
pub trait WorldStore {
    /// Insert or replace a batch of records. All or nothing.
    fn put_chunks(&mut self, records: &[ChunkRecord]) -> Result<()>;

    /// Every stored chunk record, ordered by key.
    fn all_chunks(&self) -> Result<Vec<ChunkRecord>>;

    /// Remove every chunk record.
    fn clear_chunks(&mut self) -> Result<()>;

    /// Replace the metadata record.
    fn put_meta(&mut self, meta: &MetaRecord) -> Result<()>;

    /// The metadata record, if one was ever written.
    fn meta(&self) -> Result<Option<MetaRecord>>;
}

/// Chunk file header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChunkFileHeader {
    magic: u32,
    version: u16,
    crc32: u32,
    payload_len: u32,
}

impl ChunkFileHeader {
    fn new(crc32: u32, payload_len: u32) -> Self {
        Self {
            magic: CHUNK_FILE_MAGIC,
            version: CHUNK_FILE_VERSION,
            crc32,
            payload_len,
        }
    }

    fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..10].copy_from_slice(&self.crc32.to_le_bytes());
        bytes[10..14].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            anyhow::bail!("Chunk file header too short");
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != CHUNK_FILE_MAGIC {
            anyhow::bail!(
                "Invalid chunk file magic: expected 0x{:08X}, got 0x{:08X}",
                CHUNK_FILE_MAGIC,
                magic
            );
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != CHUNK_FILE_VERSION {
            anyhow::bail!("Unsupported chunk file version {version}");
        }
        let crc32 = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            magic,
            version,
            crc32,
            payload_len,
        })
    }
}

type RecordMap = BTreeMap<ChunkKey, ChunkRecord>;

/// Directory-backed store.
///
/// The chunk map is kept in memory and the whole file is rewritten per batch.
pub struct FileStore {
    dir: PathBuf,
    records: RecordMap,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create save directory {}", dir.display()))?;
        let records = read_chunk_file(&dir.join(CHUNK_FILE))?;
        debug!(dir = %dir.display(), chunks = records.len(), "Opened file store");
        Ok(Self { dir, records })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn chunk_path(&self) -> PathBuf {
        self.dir.join(CHUNK_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(META_FILE)
    }
}

fn read_chunk_file(path: &Path) -> Result<RecordMap> {
    if !path.exists() {
        return Ok(RecordMap::new());
    }
    let bytes = fs::read(path).context("Failed to read chunk file")?;
    let header = ChunkFileHeader::from_bytes(&bytes)?;

    let payload = bytes
        .get(HEADER_LEN..HEADER_LEN + header.payload_len as usize)
        .context("Chunk file payload truncated")?;

    let mut hasher = Hasher::new();
    hasher.update(payload);
    let computed_crc = hasher.finalize();
    if computed_crc != header.crc32 {
        anyhow::bail!(
            "CRC32 mismatch: expected {:08X}, got {:08X}",
            header.crc32,
            computed_crc
        );
    }

    let decompressed = zstd::decode_all(payload).context("Failed to decompress chunk file")?;
    bincode::deserialize(&decompressed).context("Failed to deserialize chunk records")
}

fn write_chunk_file(path: &Path, records: &RecordMap) -> Result<()> {
    let serialized = bincode::serialize(records).context("Failed to serialize chunk records")?;

    // Compress with zstd (level 3 for balanced speed/compression).
    let compressed = zstd::encode_all(&serialized[..], 3).context("Failed to compress chunks")?;

    let mut hasher = Hasher::new();
    hasher.update(&compressed);
    let payload_len = u32::try_from(compressed.len()).context("Chunk file payload too large")?;
    let header = ChunkFileHeader::new(hasher.finalize(), payload_len);

    let mut bytes = Vec::with_capacity(HEADER_LEN + compressed.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&compressed);
    write_atomic(path, &bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

impl WorldStore for FileStore {
    fn put_chunks(&mut self, records: &[ChunkRecord]) -> Result<()> {
        let mut next = self.records.clone();
        for record in records {
            next.insert(record.key, record.clone());
        }
        write_chunk_file(&self.chunk_path(), &next)?;
        self.records = next;
        Ok(())
    }

    fn all_chunks(&self) -> Result<Vec<ChunkRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn clear_chunks(&mut self) -> Result<()> {
        write_chunk_file(&self.chunk_path(), &RecordMap::new())?;
        self.records.clear();
        Ok(())
    }

    fn put_meta(&mut self, meta: &MetaRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(meta).context("Failed to serialize metadata")?;
        write_atomic(&self.meta_path(), &json)
    }

    fn meta(&self) -> Result<Option<MetaRecord>> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).context("Failed to read metadata")?;
        let meta = serde_json::from_slice(&bytes).context("Failed to parse metadata")?;
        Ok(Some(meta))
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: RecordMap,
    meta: Option<MetaRecord>,
    fail_writes: bool,
}

/// In-memory store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail, to exercise retry paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    pub fn chunk_count(&self) -> usize {
        self.inner.borrow().records.len()
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.inner.borrow().records.contains_key(&ChunkKey::from_pos(pos))
    }

    fn check_writable(&self) -> Result<()> {
        if self.inner.borrow().fail_writes {
            anyhow::bail!("memory store is read-only");
        }
        Ok(())
    }
}

impl WorldStore for MemoryStore {
    fn put_chunks(&mut self, records: &[ChunkRecord]) -> Result<()> {
        self.check_writable()?;
        let mut inner = self.inner.borrow_mut();
        for record in records {
            inner.records.insert(record.key, record.clone());
        }
        Ok(())
    }

    fn all_chunks(&self) -> Result<Vec<ChunkRecord>> {
        Ok(self.inner.borrow().records.values().cloned().collect())
    }

    fn clear_chunks(&mut self) -> Result<()> {
        self.check_writable()?;
        self.inner.borrow_mut().records.clear();
        Ok(())
    }

    fn put_meta(&mut self, meta: &MetaRecord) -> Result<()> {
        self.check_writable()?;
        self.inner.borrow_mut().meta = Some(meta.clone());
        Ok(())
    }

    fn meta(&self) -> Result<Option<MetaRecord>> {
        Ok(self.inner.borrow().meta.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terralite_core::Tile;

    fn sample_record(cx: i32, cy: i32) -> ChunkRecord {
        let mut chunk = Chunk::new(ChunkPos::new(cx, cy));
        chunk.set_tile(1, 1, Tile::Stone);
        chunk.set_background(2, 2, Tile::Background);
        ChunkRecord::from_chunk(&chunk)
    }

    #[test]
    fn header_roundtrip() {
        let header = ChunkFileHeader::new(0xDEAD_BEEF, 1234);
        let parsed = ChunkFileHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn header_rejects_bad_magic() {
        let mut bytes = ChunkFileHeader::new(0, 0).to_bytes();
        bytes[0] ^= 0xFF;
        assert!(ChunkFileHeader::from_bytes(&bytes).is_err());
        assert!(ChunkFileHeader::from_bytes(&bytes[..4]).is_err());
    }

    #[test]
    fn record_decodes_to_same_layers() {
        let record = sample_record(-3, 2);
        assert_eq!(record.key.to_string(), "-3,2");
        let chunk = record.decode().unwrap();
        assert_eq!(chunk.position(), ChunkPos::new(-3, 2));
        assert_eq!(chunk.tile(1, 1), Tile::Stone);
        assert_eq!(chunk.background(2, 2), Tile::Background);
        assert!(chunk.is_generated());
    }

    #[test]
    fn record_json_shape() {
        let record = sample_record(4, 1);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["key"], "4,1");
        assert_eq!(json["cx"], 4);
        assert!(json["tiles"].is_array());
    }

    #[test]
    fn meta_tool_accepts_none_and_unknown() {
        let json = r#"{"key":"main","seed":7,"player":{"x":1.0,"y":2.0},"tool":"none"}"#;
        let meta: MetaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(meta.tool, None);
        assert_eq!(meta.inventory, SavedInventory::default());

        let json = r#"{"seed":7,"player":{"x":1.0,"y":2.0},"tool":"axe"}"#;
        let meta: MetaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(meta.tool, Some(Tool::Axe));
        assert_eq!(meta.key, META_KEY);

        let json = r#"{"seed":7,"player":{"x":1.0,"y":2.0},"tool":"laser"}"#;
        let meta: MetaRecord = serde_json::from_str(json).unwrap();
        assert_eq!(meta.tool, None);
    }

    #[test]
    fn memory_store_handles_share_contents() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.put_chunks(&[sample_record(0, 0)]).unwrap();
        assert_eq!(store.chunk_count(), 1);
        assert!(store.contains(ChunkPos::new(0, 0)));

        store.set_fail_writes(true);
        assert!(writer.put_chunks(&[sample_record(1, 0)]).is_err());
        assert_eq!(store.chunk_count(), 1);
    }
}
