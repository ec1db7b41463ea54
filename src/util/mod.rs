//! # Utility Modules
//!
//! Common helpers used throughout the crate: little-endian byte writers for
//! the Chapter 10 packet builder and hex encoding for test fixtures and
//! diagnostic dumps.

pub mod bytes;
pub mod hex;

pub use self::bytes::{
    read_u16_le, read_u32_le, read_u48_le, read_u64_le, write_u16_le, write_u32_le, write_u48_le,
    write_u64_le,
};
pub use hex::{decode_hex, encode_hex, hex_to_bytes};
