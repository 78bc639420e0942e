//! Integer hashing and the mulberry32 stream used by world generation.
//!
//! Everything here is pure 32-bit arithmetic so a seed reproduces the same
//! world on every platform.

use rand::RngCore;

/// Domain salt mixed into the world seed for per-column tree streams.
pub const TREE_COLUMN_SALT: u32 = 0xA53A_9A4B;

/// Mix two integers into a well-distributed 32-bit value.
#[inline]
pub fn hash2i(a: u32, b: i32) -> u32 {
    let a = (a ^ 0x9E37_79B1).wrapping_mul(0x85EB_CA77) ^ (b as u32);
    a ^ (a >> 16)
}

/// One mulberry32 round: advance `state` and return the mixed output.
#[inline]
pub(crate) fn mulberry32_step(state: &mut u32) -> u32 {
    *state = state.wrapping_add(0x6D2B_79F5);
    let mut t = *state;
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    t ^ (t >> 14)
}

/// Small, fast deterministic PRNG.
///
/// Exposed as a [`RngCore`] so generation code can use the `rand` helpers,
/// but the tree placer mostly calls [`Mulberry32::next_f64`] directly.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Seed a new stream.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Stream dedicated to the tree decision and shape of column `gx`.
    pub fn for_column(world_seed: u64, gx: i32) -> Self {
        Self::new(hash2i(world_seed as u32 ^ TREE_COLUMN_SALT, gx))
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        f64::from(mulberry32_step(&mut self.state)) / 4_294_967_296.0
    }

    /// Uniform float in `[a, b)`.
    pub fn range_f64(&mut self, a: f64, b: f64) -> f64 {
        a + self.next_f64() * (b - a)
    }

    /// Uniform integer in `[a, b]`.
    pub fn range_i32(&mut self, a: i32, b: i32) -> i32 {
        self.range_f64(f64::from(a), f64::from(b) + 1.0).floor() as i32
    }

    /// Fair coin.
    pub fn coin(&mut self) -> bool {
        self.next_f64() < 0.5
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        mulberry32_step(&mut self.state)
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_u32());
        let hi = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
