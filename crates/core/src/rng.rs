//! RNG module - deterministic draws for order selection and the item stream
//!
//! All randomness in the core flows through [`SimpleRng`], so a seed fully
//! determines an attempt: which recipe is drawn, which kinds and freshness
//! levels spawn, and which lane each item rides on.

/// 32-bit linear congruential generator (Numerical Recipes constants).
#[derive(Debug, Clone)]
pub struct SimpleRng {
    seed: u32,
    state: u32,
}

impl SimpleRng {
    /// A zero seed is replaced by 1 so the sequence does not start at zero.
    pub fn new(seed: u32) -> Self {
        let seed = seed.max(1);
        Self { seed, state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Scales by the high bits; the low bits of an LCG have short periods
    /// (bit 0 simply alternates), which would make two-way draws predictable.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max <= 1 {
            // Still advance so draw sequences do not depend on pool sizes.
            self.next_u32();
            return 0;
        }
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Uniform pick from a slice; `None` only when the slice is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.next_range(items.len() as u32) as usize;
        items.get(i)
    }

    /// Seed the generator was created with.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for SimpleRng {
    fn default() -> Self {
        Self::new(1)
    }
}
