//! Run-length codec for chunk tile layers.
//!
//! A layer is stored as flat `(tile id, run length)` pairs of `u16`. Runs longer
//! than `u16::MAX` are split.

use terralite_core::{Tile, UnknownTileId, CHUNK_AREA};
use thiserror::Error;

/// Errors produced while decoding a stored layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("run-length data has odd length {0}")]
    OddLength(usize),
    #[error(transparent)]
    UnknownTile(#[from] UnknownTileId),
    #[error("zero-length run at pair {0}")]
    ZeroRun(usize),
    #[error("run-length data expands past {} tiles", CHUNK_AREA)]
    Overflow,
    #[error("run-length data expands to {0} tiles, expected {}", CHUNK_AREA)]
    Underflow(usize),
}

/// Encode a tile layer.
pub fn rle_encode(tiles: &[Tile]) -> Vec<u16> {
    let mut out = Vec::new();
    let mut iter = tiles.iter().copied();
    let Some(mut current) = iter.next() else {
        return out;
    };
    let mut run: u16 = 1;
    for tile in iter {
        if tile == current && run < u16::MAX {
            run += 1;
        } else {
            out.push(current.id());
            out.push(run);
            current = tile;
            run = 1;
        }
    }
    out.push(current.id());
    out.push(run);
    out
}

/// Decode a layer of exactly [`CHUNK_AREA`] tiles.
pub fn rle_decode(data: &[u16]) -> Result<Vec<Tile>, CodecError> {
    if data.len() % 2 != 0 {
        return Err(CodecError::OddLength(data.len()));
    }
    let mut out = Vec::with_capacity(CHUNK_AREA);
    for (i, pair) in data.chunks_exact(2).enumerate() {
        let tile = Tile::from_id(pair[0])?;
        let run = usize::from(pair[1]);
        if run == 0 {
            return Err(CodecError::ZeroRun(i));
        }
        if out.len() + run > CHUNK_AREA {
            return Err(CodecError::Overflow);
        }
        out.resize(out.len() + run, tile);
    }
    if out.len() != CHUNK_AREA {
        return Err(CodecError::Underflow(out.len()));
    }
    Ok(out)
}
