use rand_core::{Error, RngCore, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

// --- Pseudo-Random Number Generator ---
// Algorithm: xorshift32 (13, 17, 5), seeded by FNV-1a over the seed string.
// Not cryptographic. A given seed string always replays the same pull sequence.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;
const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}

/// FNV-1a (32-bit) over the UTF-16 code units of `seed`.
pub fn hash_seed(seed: &str) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for unit in seed.encode_utf16() {
        h ^= u32::from(unit);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Uniform float in [0.0, 1.0) from any `RngCore`, using the top 32 bits of entropy
/// the same way `Rng::next_f64` does.
#[inline]
pub fn unit_f64<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    f64::from(rng.next_u32()) / TWO_POW_32
}

impl Rng {
    pub fn from_state(state: u32) -> Self {
        // xorshift never leaves 0
        let state = if state == 0 { FNV_OFFSET_BASIS } else { state };
        Rng { state }
    }

    pub fn from_seed_str(seed: &str) -> Self {
        Self::from_state(hash_seed(seed))
    }

    /// `None` or an empty string falls back to a time-based seed.
    pub fn from_optional_seed(seed: Option<&str>) -> Self {
        match seed {
            Some(s) if !s.is_empty() => Self::from_seed_str(s),
            _ => Self::new(),
        }
    }

    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        // Fold the 128-bit nanosecond count down to 32 bits.
        let folded = (nanos ^ (nanos >> 32) ^ (nanos >> 64) ^ (nanos >> 96)) as u32;
        Self::from_state(folded)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    // Generate float in [0.0, 1.0): u32 / 2^32
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for Rng {
    fn next_u32(&mut self) -> u32 {
        Rng::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(Rng::next_u32(self));
        let lo = u64::from(Rng::next_u32(self));
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = Rng::next_u32(self).to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Rng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::from_state(u32::from_le_bytes(seed))
    }
}

/// Replays a fixed list of unit floats, then keeps returning the last one.
/// Lets tests pin exact roll outcomes.
#[cfg(test)]
pub(crate) struct ScriptedRng {
    values: Vec<f64>,
    pos: usize,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(values: &[f64]) -> Self {
        assert!(!values.is_empty());
        ScriptedRng {
            values: values.to_vec(),
            pos: 0,
        }
    }

    pub(crate) fn draws(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        let idx = self.pos.min(self.values.len() - 1);
        self.pos += 1;
        (self.values[idx] * TWO_POW_32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.next_u32())
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for b in dest.iter_mut() {
            *b = self.next_u32() as u8;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
