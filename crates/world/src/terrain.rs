//! Terrain sampling: column surface heights and the column fill profile.
//!
//! Heights are a pure function of `(seed, gx)`, so any chunk can sample its
//! neighbours' columns and seams always line up.

use terralite_core::{Tile, WORLD_HEIGHT};

use crate::noise::ValueNoise1D;

/// Nominal surface row before noise is applied.
pub const TERRAIN_BASELINE: i32 = WORLD_HEIGHT * 45 / 100;

/// Highest surface row allowed (smallest y).
pub const SURFACE_MIN: i32 = 18;

/// Lowest surface row allowed (largest y).
pub const SURFACE_MAX: i32 = WORLD_HEIGHT - 8;

/// Soil rows below the surface row before stone starts.
pub const SOIL_DEPTH: i32 = 10;

/// Air rows directly above the surface that still get background filler.
pub const BACKGROUND_SKIRT: i32 = 6;

const OCTAVES: u32 = 4;
const FREQUENCY: f64 = 0.02;
const AMPLITUDE: f64 = 14.0;

/// Maps a global column to its surface row.
pub struct TerrainSampler {
    noise: ValueNoise1D,
}

impl TerrainSampler {
    /// Sampler for a world seed. The terrain stream uses the low 32 bits.
    pub fn new(world_seed: u64) -> Self {
        Self {
            noise: ValueNoise1D::new(world_seed as u32),
        }
    }

    /// Surface row of column `gx`, clamped to `[SURFACE_MIN, SURFACE_MAX]`.
    ///
    /// The surface row holds the grass tile; `y` grows downward.
    pub fn surface_height(&mut self, gx: i32) -> i32 {
        let offset = self
            .noise
            .fractal(f64::from(gx), OCTAVES, FREQUENCY, AMPLITUDE);
        let h = (f64::from(TERRAIN_BASELINE) + offset).floor() as i32;
        h.clamp(SURFACE_MIN, SURFACE_MAX)
    }

    /// True when column `gx` is at least as low as both neighbours.
    pub fn is_ridge(&mut self, gx: i32) -> bool {
        let h = self.surface_height(gx);
        h >= self.surface_height(gx - 1) && h >= self.surface_height(gx + 1)
    }
}

/// One-shot surface height lookup.
pub fn surface_height(world_seed: u64, gx: i32) -> i32 {
    TerrainSampler::new(world_seed).surface_height(gx)
}

/// Foreground and background tiles of row `y` in a column whose surface row is
/// `height`.
pub fn column_tiles(height: i32, y: i32) -> (Tile, Tile) {
    if y > height + SOIL_DEPTH {
        (Tile::Stone, Tile::Background)
    } else if y == height {
        (Tile::Grass, Tile::Background)
    } else if y > height {
        (Tile::Dirt, Tile::Background)
    } else if y >= height - BACKGROUND_SKIRT {
        (Tile::Empty, Tile::Background)
    } else {
        (Tile::Empty, Tile::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_matches_world_height() {
        assert_eq!(TERRAIN_BASELINE, 90);
        assert_eq!(SURFACE_MAX, 192);
    }

    #[test]
    fn heights_are_clamped() {
        let mut sampler = TerrainSampler::new(0xFEED);
        for gx in -10_000..10_000 {
            let h = sampler.surface_height(gx);
            assert!((SURFACE_MIN..=SURFACE_MAX).contains(&h));
        }
    }

    #[test]
    fn heights_stay_near_baseline() {
        let mut sampler = TerrainSampler::new(42);
        for gx in -2_000..2_000 {
            let h = sampler.surface_height(gx);
            // Four octaves of amplitude 14 sum to at most 26.25.
            assert!((h - TERRAIN_BASELINE).abs() <= 27, "gx={gx} h={h}");
        }
    }

    #[test]
    fn heights_are_pure_in_seed_and_column() {
        let mut warm = TerrainSampler::new(42);
        let forward: Vec<_> = (-64..64).map(|gx| warm.surface_height(gx)).collect();
        let mut cold = TerrainSampler::new(42);
        let backward: Vec<_> = (-64..64).rev().map(|gx| cold.surface_height(gx)).collect();
        let backward: Vec<_> = backward.into_iter().rev().collect();
        assert_eq!(forward, backward);
        assert_eq!(surface_height(42, 17), warm.surface_height(17));
    }

    #[test]
    fn neighbouring_columns_change_gently() {
        let mut sampler = TerrainSampler::new(7);
        for gx in -500..500 {
            let d = (sampler.surface_height(gx) - sampler.surface_height(gx + 1)).abs();
            assert!(d <= 5, "cliff of {d} at gx={gx}");
        }
    }

    #[test]
    fn column_profile_layers() {
        let h = 90;
        assert_eq!(column_tiles(h, h), (Tile::Grass, Tile::Background));
        assert_eq!(column_tiles(h, h + 1), (Tile::Dirt, Tile::Background));
        assert_eq!(column_tiles(h, h + SOIL_DEPTH), (Tile::Dirt, Tile::Background));
        assert_eq!(column_tiles(h, h + SOIL_DEPTH + 1), (Tile::Stone, Tile::Background));
        assert_eq!(column_tiles(h, h - 1), (Tile::Empty, Tile::Background));
        assert_eq!(column_tiles(h, h - BACKGROUND_SKIRT), (Tile::Empty, Tile::Background));
        assert_eq!(column_tiles(h, h - BACKGROUND_SKIRT - 1), (Tile::Empty, Tile::Empty));
    }
}
