use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use rand_core::RngCore;

const MAXF64: f64 = 9007199254740992.0;

/// Draws a fresh 32-byte seed from the operating system.
pub fn new_seed() -> [u8; 32] {
    let mut seed: [u8; 32] = [0u8; 32];
    rand::rng().fill_bytes(&mut seed);
    seed
}

/// Deterministic pseudorandom stream seeded with 32 bytes.
///
/// Every sampling operation of the engine draws from a [Source], so a fixed
/// seed reproduces keys and ciphertexts bit for bit.
pub struct Source {
    source: ChaCha8Rng,
}

impl Source {
    pub fn new(seed: [u8; 32]) -> Source {
        Source {
            source: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Seeds a new source from operating system entropy.
    pub fn from_entropy() -> Source {
        Source::new(new_seed())
    }

    pub fn branch(&mut self) -> ([u8; 32], Self) {
        let seed: [u8; 32] = self.new_seed();
        (seed, Source::new(seed))
    }

    pub fn new_seed(&mut self) -> [u8; 32] {
        let mut seed: [u8; 32] = [0u8; 32];
        self.fill_bytes(&mut seed);
        seed
    }

    /// Returns a value uniform in `[0, max)` by rejection on `next_u64() & mask`.
    ///
    /// `mask` must cover `max`, i.e. `mask >= max - 1`.
    #[inline(always)]
    pub fn next_u64n(&mut self, max: u64, mask: u64) -> u64 {
        let mut x: u64 = self.next_u64() & mask;
        while x >= max {
            x = self.next_u64() & mask;
        }
        x
    }

    /// Returns a value uniform in `[0, q)`.
    #[inline(always)]
    pub fn next_u64_mod(&mut self, q: u64) -> u64 {
        debug_assert!(q > 0, "modulus must be non-zero");
        let mask: u64 = u64::MAX >> (q - 1).leading_zeros().min(63);
        self.next_u64n(q, mask)
    }

    #[inline(always)]
    pub fn next_f64(&mut self, min: f64, max: f64) -> f64 {
        min + ((self.next_u64() << 11 >> 11) as f64) / MAXF64 * (max - min)
    }

    #[inline(always)]
    pub fn next_i64(&mut self) -> i64 {
        self.next_u64() as i64
    }
}

impl RngCore for Source {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.source.next_u32()
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.source.next_u64()
    }

    #[inline(always)]
    fn fill_bytes(&mut self, bytes: &mut [u8]) {
        self.source.fill_bytes(bytes)
    }
}
