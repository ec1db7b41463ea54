//! # Little-Endian Byte Writers
//!
//! Every integer written into a Chapter 10 file is little-endian regardless
//! of host byte order (spec §9, "Endianness discipline"). These helpers are
//! the only place that touches byte order so the packet builder and writer
//! never reach for `to_ne_bytes` by accident.

use bytes::{BufMut, BytesMut};

pub fn write_u16_le(buf: &mut BytesMut, value: u16) {
    buf.put_u16_le(value);
}

pub fn write_u32_le(buf: &mut BytesMut, value: u32) {
    buf.put_u32_le(value);
}

/// Writes the low 48 bits of `value` as 6 little-endian bytes (the RTC tick
/// field in common packet headers and the CSDW `message_count`/flags words).
pub fn write_u48_le(buf: &mut BytesMut, value: u64) {
    let bytes = value.to_le_bytes();
    buf.put_slice(&bytes[0..6]);
}

pub fn write_u64_le(buf: &mut BytesMut, value: u64) {
    buf.put_u64_le(value);
}

pub fn read_u16_le(data: &[u8]) -> u16 {
    u16::from_le_bytes([data[0], data[1]])
}

pub fn read_u32_le(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[0], data[1], data[2], data[3]])
}

pub fn read_u48_le(data: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[0..6].copy_from_slice(&data[0..6]);
    u64::from_le_bytes(bytes)
}

pub fn read_u64_le(data: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[0..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u48_roundtrip() {
        let mut buf = BytesMut::new();
        write_u48_le(&mut buf, 0x0000_BEEF_1234);
        assert_eq!(buf.len(), 6);
        assert_eq!(read_u48_le(&buf), 0x0000_BEEF_1234);
    }

    #[test]
    fn u16_roundtrip() {
        let mut buf = BytesMut::new();
        write_u16_le(&mut buf, 0xEB25);
        assert_eq!(&buf[..], &[0x25, 0xEB]);
        assert_eq!(read_u16_le(&buf), 0xEB25);
    }
}
