//! # 1553 Word Codec (C1)
//!
//! Encodes scalar field values into one or more 16-bit words and assembles
//! command/status words, per spec §4.1. All words are 16-bit little-endian
//! when serialized as bytes (serialization itself lives in [`crate::util`]);
//! this module only deals in `u16` values and byte arrays for split words.

pub mod command;
pub mod encode;

pub use command::{encode_command_word, encode_status_word, CommandDirection, StatusFlags};
pub use encode::{encode_scalar, pack_bitfield, Encoding, WordOrder};

use thiserror::Error;

/// Failure modes for the word codec (spec §4.1).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("value {value} is out of range for encoding {encoding:?}")]
    OutOfRangeForEncoding { value: f64, encoding: Encoding },

    #[error("bitfield overflow: raw value {raw} does not fit mask 0x{mask:04X}")]
    BitfieldOverflow { raw: i64, mask: u16 },

    #[error("invalid bitfield placement: mask=0x{mask:04X} shift={shift} overflows a 16-bit word")]
    BitfieldPlacementInvalid { mask: u16, shift: u32 },
}
