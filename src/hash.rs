//! Round-salted string hash.
//!
//! A djb2-style multiplicative hash (`h = h * 33 ^ byte`) over the whole key,
//! followed by `round` extra update steps that cycle over the key again. Each
//! nesting level hashes with its own round, so two keys that share a bucket at
//! one level are very likely to land in different buckets one level down.

use crate::BUCKETS_PER_TABLE;

/// Starting accumulator value.
pub const SEED: u64 = 5381;

/// Large round used for hash distribution checks.
pub const INITIAL_SALT: usize = 10_000_001;

#[inline]
fn step(h: u64, byte: u8) -> u64 {
    h.wrapping_mul(33) ^ u64::from(byte)
}

/// Hash `key` for nesting level `round`.
///
/// Every byte is consumed exactly once, in order, then `round` further steps
/// read `key[j % key.len()]` for `j in 0..round`. The accumulator wraps on
/// overflow and the absolute value of its signed reading is returned. An empty
/// key hashes to [`SEED`] regardless of `round`.
pub fn hash(key: &[u8], round: usize) -> u64 {
    if key.is_empty() {
        return SEED;
    }

    let mut h = key.iter().fold(SEED, |h, &b| step(h, b));
    for j in 0..round {
        h = step(h, key[j % key.len()]);
    }

    (h as i64).unsigned_abs()
}

/// Bucket index of `key` within a table at nesting level `round`.
#[inline]
pub fn bucket_index(key: &[u8], round: usize) -> usize {
    (hash(key, round) % BUCKETS_PER_TABLE as u64) as usize
}
