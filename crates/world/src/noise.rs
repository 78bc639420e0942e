//! Noise generation utilities for terrain generation.
//!
//! 1D smooth value noise: random values on the integer lattice blended with a
//! smoothstep, summed over octaves for rolling hills and forest density.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::rng::mulberry32_step;

/// Lattice values kept per noise stream.
const LATTICE_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Seeded 1D value noise with a bounded lattice cache.
pub struct ValueNoise1D {
    seed: u32,
    lattice: LruCache<i32, f64>,
}

impl ValueNoise1D {
    /// Create a noise stream for `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            lattice: LruCache::new(LATTICE_CACHE_CAPACITY),
        }
    }

    /// Seed this stream was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Pseudo-random value in `[-1, 1)` attached to lattice point `i`.
    fn lattice_value(seed: u32, i: i32) -> f64 {
        let mut state = (i as u32) ^ seed;
        let raw = mulberry32_step(&mut state);
        f64::from(raw) / 4_294_967_296.0 * 2.0 - 1.0
    }

    fn gradient(&mut self, i: i32) -> f64 {
        let seed = self.seed;
        *self
            .lattice
            .get_or_insert(i, || Self::lattice_value(seed, i))
    }

    /// Sample the noise at `x`. Continuous in `x`, range `[-1, 1]`.
    pub fn sample(&mut self, x: f64) -> f64 {
        let floor = x.floor();
        let i0 = floor as i32;
        let t = x - floor;
        let s = t * t * (3.0 - 2.0 * t);
        let g0 = self.gradient(i0);
        let g1 = self.gradient(i0.wrapping_add(1));
        g0 * (1.0 - s) + g1 * s
    }

    /// Fractal sum of `octaves` layers, each at double the frequency and half
    /// the amplitude of the previous one, scaled by `amplitude`.
    pub fn fractal(&mut self, x: f64, octaves: u32, frequency: f64, amplitude: f64) -> f64 {
        let mut n = 0.0;
        let mut a = 1.0;
        let mut f = 1.0;
        for _ in 0..octaves {
            n += self.sample(x * frequency * f) * a;
            a *= 0.5;
            f *= 2.0;
        }
        n * amplitude
    }

    /// Number of lattice points currently cached.
    pub fn cached_points(&self) -> usize {
        self.lattice.len()
    }
}
