//! Deterministic identifier hashing.
//!
//! Generated names must be identical across runs, processes and machines
//! for identical input, so this module never touches `std::hash::Hash`,
//! pointer identity or any randomly seeded hasher.
//!
//! # Algorithm
//!
//! Each string component is hashed with 32-bit FNV-1a over its UTF-8 bytes;
//! integer components are taken as-is. Components are folded into a 64-bit
//! accumulator starting from a fixed seed with `acc = acc * 31 + component`
//! (wrapping), the sign bit is masked off, and the result is rendered as
//! 16 lowercase hex digits.
//!
//! Collisions only cause duplicate generated names; they are reported by the
//! synthesizer's validation pass, never treated as errors.

const SEED: u64 = 17;
const MULTIPLIER: u64 = 31;
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const NON_NEGATIVE_MASK: u64 = u64::MAX >> 1;

/// 32-bit FNV-1a over the UTF-8 bytes of `s`.
#[inline]
pub fn fnv1a_32(s: &str) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in s.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Incremental combination hash.
///
/// ```
/// use tether_ir::StableHasher;
///
/// let token = StableHasher::new().str("Person").int(10).finish();
/// assert_eq!(token.len(), 16);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StableHasher {
    acc: u64,
}

impl StableHasher {
    pub fn new() -> Self {
        StableHasher { acc: SEED }
    }

    #[inline]
    fn fold(self, component: u64) -> Self {
        StableHasher {
            acc: self
                .acc
                .wrapping_mul(MULTIPLIER)
                .wrapping_add(component),
        }
    }

    /// Fold in a string component.
    #[must_use]
    pub fn str(self, s: &str) -> Self {
        self.fold(u64::from(fnv1a_32(s)))
    }

    /// Fold in an integer component.
    #[must_use]
    pub fn int(self, n: u32) -> Self {
        self.fold(u64::from(n))
    }

    /// The masked, non-negative accumulator.
    pub fn value(self) -> u64 {
        self.acc & NON_NEGATIVE_MASK
    }

    /// 16 lowercase hex digits.
    pub fn finish(self) -> String {
        format!("{:016x}", self.value())
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash of `(owner type, source file, source line, discriminator)`.
///
/// Pure: identical inputs always produce the identical token. The
/// discriminator may be empty.
pub fn stable_hash(owner_type: &str, file: &str, line: u32, discriminator: &str) -> String {
    StableHasher::new()
        .str(owner_type)
        .str(file)
        .int(line)
        .str(discriminator)
        .finish()
}
