//! Hex encoding/decoding helpers for diagnostic output and test fixtures.
//!
//! ```rust
//! use ch10gen::util::hex::{encode_hex, decode_hex};
//!
//! let data = [0xEB, 0x25, 0x02, 0x00];
//! let hex_str = encode_hex(&data);
//! assert_eq!(hex_str, "eb250200");
//!
//! let decoded = decode_hex(&hex_str).unwrap();
//! assert_eq!(decoded, data);
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("empty hex string")]
    EmptyString,

    #[error("hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to a lowercase hex string.
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode a hex string to bytes. Accepts upper- or lowercase; whitespace is
/// stripped before decoding.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    if hex_str.is_empty() {
        return Err(HexError::EmptyString);
    }

    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Build test fixture bytes from a hex literal. Panics on invalid hex
/// (intended for test code only).
pub fn hex_to_bytes(hex: &str) -> Vec<u8> {
    decode_hex(hex).expect("invalid hex in test data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let data = vec![0xEB, 0x25, 0x02, 0x00, 0x08, 0x00, 0x72, 0x45];
        let encoded = encode_hex(&data);
        let decoded = decode_hex(&encoded).unwrap();
        assert_eq!(data, decoded);
    }

    #[test]
    fn decode_with_whitespace() {
        let hex = "eb 25 02 00";
        let expected = vec![0xEB, 0x25, 0x02, 0x00];
        assert_eq!(decode_hex(hex).unwrap(), expected);
    }

    #[test]
    fn hex_to_bytes_builds_fixture_data() {
        let data = hex_to_bytes("eb250200");
        assert_eq!(data, vec![0xEB, 0x25, 0x02, 0x00]);
    }

    #[test]
    fn decode_errors_on_empty_or_odd_or_invalid() {
        assert!(decode_hex("").is_err());
        assert!(decode_hex("1").is_err());
        assert!(decode_hex("GG").is_err());
    }
}
