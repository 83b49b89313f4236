//! Hash builders used by the engines.

use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher, Hash, Hasher};

/// Hash builder used when none is specified.
///
/// `DefaultHasher::new()` is keyed with constant keys, so every map built with this
/// builder distributes keys the same way across runs.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;

/// Hash builder producing [`IdentityHasher`]s.
pub type BuildIdentityHasher = BuildHasherDefault<IdentityHasher>;

/// Multiplier folding consecutive writes together.
const MULTIPLIER: u64 = 31;

/// Hasher mapping an integer key to its own value.
///
/// A single integer write hashes to the integer itself (negative numbers sign-extend),
/// which makes the slot of a key predictable: with 32 slots the keys `1`, `33` and `65`
/// all land in slot 1. Byte writes and multi-field keys are folded polynomially so that
/// strings and tuples still hash deterministically.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityHasher {
    /// Accumulated hash value
    hash: u64,
}

impl IdentityHasher {
    /// Folds one word into the running hash.
    fn fold(&mut self, word: u64) {
        self.hash = self.hash.wrapping_mul(MULTIPLIER).wrapping_add(word);
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_lossless)]
impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.fold(u64::from(byte));
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.fold(u64::from(i));
    }

    fn write_u16(&mut self, i: u16) {
        self.fold(u64::from(i));
    }

    fn write_u32(&mut self, i: u32) {
        self.fold(u64::from(i));
    }

    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_u128(&mut self, i: u128) {
        self.fold(i as u64);
    }

    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }

    fn write_i8(&mut self, i: i8) {
        self.fold(i as u64);
    }

    fn write_i16(&mut self, i: i16) {
        self.fold(i as u64);
    }

    fn write_i32(&mut self, i: i32) {
        self.fold(i as u64);
    }

    fn write_i64(&mut self, i: i64) {
        self.fold(i as u64);
    }

    fn write_isize(&mut self, i: isize) {
        self.fold(i as u64);
    }
}

/// Hashes `key` with a fresh hasher from `build`.
pub(crate) fn make_hash<Q, S>(build: &S, key: &Q) -> u64
where
    Q: Hash + ?Sized,
    S: BuildHasher,
{
    build.hash_one(key)
}

/// Reduces `hash` into `0..modulus`.
///
/// # Panics
///
/// Panics if `modulus` is zero; every engine keeps at least one slot.
#[allow(clippy::cast_possible_truncation, clippy::arithmetic_side_effects)]
pub(crate) fn reduce(hash: u64, modulus: usize) -> usize {
    // usize -> u64 is lossless on all supported targets and the remainder fits back
    (hash % modulus as u64) as usize
}
