//! Common Chapter 10 packet header assembly (spec §4.6).

use crate::constants::{PACKET_HEADER_LEN, PACKET_SYNC};
use crate::util::{write_u16_le, write_u32_le, write_u48_le};
use bytes::{BufMut, BytesMut};

/// The 24-byte header common to every packet kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub channel_id: u16,
    pub data_type: u8,
    pub data_type_version: u8,
    pub sequence_number: u8,
    pub packet_flags: u8,
    /// 48-bit monotonic relative time counter, in RTC ticks.
    pub relative_time_counter: u64,
}

/// Assembles one complete packet: header + zero-padded payload.
///
/// `payload` is the packet's unpadded data (spec's `data_length`); the
/// result is padded to a 4-byte boundary and `packet_length` accounts for
/// the padding while `data_length` does not (spec §4.6).
pub fn build_packet(header: PacketHeader, payload: &[u8]) -> Vec<u8> {
    let data_length = payload.len() as u32;
    let padded_len = (payload.len() + 3) & !3;
    let packet_length = (PACKET_HEADER_LEN + padded_len) as u32;

    let mut buf = BytesMut::with_capacity(PACKET_HEADER_LEN + padded_len);
    write_u16_le(&mut buf, PACKET_SYNC);
    write_u16_le(&mut buf, header.channel_id);
    write_u32_le(&mut buf, packet_length);
    write_u32_le(&mut buf, data_length);
    buf.put_u8(header.data_type_version);
    buf.put_u8(header.sequence_number);
    buf.put_u8(header.packet_flags);
    buf.put_u8(header.data_type);
    write_u48_le(&mut buf, header.relative_time_counter);

    let checksum = header_checksum(&buf);
    write_u16_le(&mut buf, checksum);

    buf.put_slice(payload);
    for _ in 0..(padded_len - payload.len()) {
        buf.put_u8(0);
    }

    buf.to_vec()
}

/// Sum of the sixteen-bit little-endian words in the first 22 header bytes,
/// modulo 2^16 (spec §4.6).
fn header_checksum(bytes_so_far: &[u8]) -> u16 {
    debug_assert_eq!(bytes_so_far.len(), 22);
    let mut sum: u32 = 0;
    for chunk in bytes_so_far.chunks_exact(2) {
        sum = sum.wrapping_add(u16::from_le_bytes([chunk[0], chunk[1]]) as u32);
    }
    (sum & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{read_u16_le, read_u32_le, read_u48_le};

    fn sample_header() -> PacketHeader {
        PacketHeader {
            channel_id: 0x0002,
            data_type: 0x19,
            data_type_version: 0x03,
            sequence_number: 7,
            packet_flags: 0,
            relative_time_counter: 123_456_789,
        }
    }

    #[test]
    fn header_fields_roundtrip_through_bytes() {
        let packet = build_packet(sample_header(), &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(read_u16_le(&packet[0..]), PACKET_SYNC);
        assert_eq!(read_u16_le(&packet[2..]), 0x0002);
        assert_eq!(read_u32_le(&packet[4..]), PACKET_HEADER_LEN as u32 + 4);
        assert_eq!(read_u32_le(&packet[8..]), 4);
        assert_eq!(packet[12], 0x03);
        assert_eq!(packet[13], 7);
        assert_eq!(packet[15], 0x19);
        assert_eq!(read_u48_le(&packet[16..]), 123_456_789);
    }

    #[test]
    fn packet_length_is_a_multiple_of_four() {
        let packet = build_packet(sample_header(), &[1, 2, 3]);
        assert_eq!(packet.len() % 4, 0);
        assert_eq!(read_u32_le(&packet[8..]), 3); // data_length excludes padding
    }

    #[test]
    fn checksum_matches_manual_sum() {
        let packet = build_packet(sample_header(), &[0, 0, 0, 0]);
        let mut expected: u32 = 0;
        for chunk in packet[0..22].chunks_exact(2) {
            expected = expected.wrapping_add(u16::from_le_bytes([chunk[0], chunk[1]]) as u32);
        }
        assert_eq!(read_u16_le(&packet[22..]), (expected & 0xFFFF) as u16);
    }
}
