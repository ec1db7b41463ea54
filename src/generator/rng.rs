//! Deterministic, splittable per-`(message, field)` PRNG streams (spec §4.3).
//!
//! Each field's sub-stream is seeded by combining the scenario seed with a
//! stable FNV-1a hash of its qualified name, so the same scenario always
//! produces the same bytes regardless of evaluation order or platform.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derives a 64-bit seed for `message.field` from the scenario's root seed.
pub fn derive_seed(root_seed: u64, message: &str, field: &str) -> u64 {
    let mut key = String::with_capacity(message.len() + field.len() + 1);
    key.push_str(message);
    key.push('\u{1}');
    key.push_str(field);
    let name_hash = fnv1a(key.as_bytes());
    root_seed ^ name_hash.rotate_left(17).wrapping_add(0x9E3779B97F4A7C15)
}

/// Creates the sub-PRNG for one `(message, field)` stream.
pub fn sub_rng(root_seed: u64, message: &str, field: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(root_seed, message, field))
}
