//! # Validator (C8)
//!
//! Streams a produced Chapter 10 file back and checks structural
//! conformance (spec §4.8). This is a read-only pass; it never mutates or
//! re-derives the file it inspects.

use crate::codec::command::decode_command_word;
use crate::constants::{
    DATA_TYPE_MS1553_F1, DATA_TYPE_TIME_F1, DATA_TYPE_TMATS, IPDH_LEN, MS1553_CSDW_LEN,
    PACKET_HEADER_LEN, PACKET_SYNC,
};
use crate::util::{read_u16_le, read_u32_le, read_u64_le};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub byte_offset: usize,
    pub description: String,
}

impl Diagnostic {
    fn error(code: &'static str, byte_offset: usize, description: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code,
            byte_offset,
            description: description.into(),
        }
    }

    fn warning(code: &'static str, byte_offset: usize, description: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            code,
            byte_offset,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

const KNOWN_DATA_TYPES: &[u8] = &[DATA_TYPE_TMATS, DATA_TYPE_TIME_F1, DATA_TYPE_MS1553_F1];

struct ParsedPacket {
    offset: usize,
    channel_id: u16,
    data_type: u8,
    data_length: u32,
    packet_length: u32,
    payload_offset: usize,
}

/// Validates a complete Chapter 10 byte stream (spec §4.8).
pub fn validate(data: &[u8]) -> ValidationReport {
    let mut diagnostics = Vec::new();
    let mut packets = Vec::new();
    let mut offset = 0usize;

    while offset + PACKET_HEADER_LEN <= data.len() {
        match parse_header(data, offset, &mut diagnostics) {
            Some(packet) => {
                let next = offset + packet.packet_length as usize;
                packets.push(packet);
                if next <= offset {
                    diagnostics.push(Diagnostic::error(
                        "E_NON_ADVANCING_PACKET",
                        offset,
                        "packet_length did not advance the read cursor; stopping scan",
                    ));
                    break;
                }
                offset = next;
            }
            None => break,
        }
    }

    check_tmats_placement(&packets, &mut diagnostics);
    check_time_before_data(&packets, &mut diagnostics);
    check_ms1553_channels(data, &packets, &mut diagnostics);

    ValidationReport { diagnostics }
}

fn parse_header(
    data: &[u8],
    offset: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<ParsedPacket> {
    let header = &data[offset..offset + PACKET_HEADER_LEN];
    let sync = read_u16_le(&header[0..]);
    if sync != PACKET_SYNC {
        diagnostics.push(Diagnostic::error(
            "E_BAD_SYNC",
            offset,
            format!("expected sync 0x{PACKET_SYNC:04X}, found 0x{sync:04X}"),
        ));
        return None;
    }

    let channel_id = read_u16_le(&header[2..]);
    let packet_length = read_u32_le(&header[4..]);
    let data_length = read_u32_le(&header[8..]);
    let data_type = header[15];

    if packet_length % 4 != 0 {
        diagnostics.push(Diagnostic::error(
            "E_PACKET_LENGTH_ALIGN",
            offset,
            format!("packet_length {packet_length} is not a multiple of 4"),
        ));
    }
    if offset + packet_length as usize > data.len() {
        diagnostics.push(Diagnostic::error(
            "E_PACKET_TRUNCATED",
            offset,
            format!(
                "packet claims {packet_length} bytes but only {} remain",
                data.len() - offset
            ),
        ));
        return None;
    }
    if !KNOWN_DATA_TYPES.contains(&data_type) {
        diagnostics.push(Diagnostic::error(
            "E_UNKNOWN_DATA_TYPE",
            offset,
            format!("unrecognized data_type 0x{data_type:02X}"),
        ));
    }

    let mut sum: u32 = 0;
    for chunk in header[0..22].chunks_exact(2) {
        sum = sum.wrapping_add(u16::from_le_bytes([chunk[0], chunk[1]]) as u32);
    }
    let expected_checksum = (sum & 0xFFFF) as u16;
    let actual_checksum = read_u16_le(&header[22..]);
    if actual_checksum != expected_checksum {
        diagnostics.push(Diagnostic::error(
            "E_BAD_CHECKSUM",
            offset,
            format!("header checksum 0x{actual_checksum:04X}, expected 0x{expected_checksum:04X}"),
        ));
    }

    let expected_packet_length = PACKET_HEADER_LEN as u32 + ((data_length + 3) & !3);
    if packet_length != expected_packet_length {
        diagnostics.push(Diagnostic::error(
            "E_LENGTH_MISMATCH",
            offset,
            format!(
                "packet_length {packet_length} does not match header+padded data_length {expected_packet_length}"
            ),
        ));
    }

    Some(ParsedPacket {
        offset,
        channel_id,
        data_type,
        data_length,
        packet_length,
        payload_offset: offset + PACKET_HEADER_LEN,
    })
}

fn check_tmats_placement(packets: &[ParsedPacket], diagnostics: &mut Vec<Diagnostic>) {
    let tmats: Vec<&ParsedPacket> = packets.iter().filter(|p| p.data_type == DATA_TYPE_TMATS).collect();
    if tmats.is_empty() {
        diagnostics.push(Diagnostic::error(
            "E_NO_TMATS",
            0,
            "file contains no TMATS packet",
        ));
    } else if tmats.len() > 1 {
        diagnostics.push(Diagnostic::error(
            "E_MULTIPLE_TMATS",
            tmats[1].offset,
            "more than one TMATS packet present",
        ));
    }
    if let Some(first) = packets.first() {
        if first.data_type != DATA_TYPE_TMATS {
            diagnostics.push(Diagnostic::error(
                "E_TMATS_NOT_FIRST",
                first.offset,
                "first packet in file is not TMATS",
            ));
        }
    }
}

fn check_time_before_data(packets: &[ParsedPacket], diagnostics: &mut Vec<Diagnostic>) {
    let mut seen_time = false;
    for packet in packets {
        match packet.data_type {
            DATA_TYPE_TIME_F1 => seen_time = true,
            DATA_TYPE_MS1553_F1 => {
                if !seen_time {
                    diagnostics.push(Diagnostic::error(
                        "E_DATA_BEFORE_TIME",
                        packet.offset,
                        "MS1553-F1 packet precedes the first Time-F1 packet",
                    ));
                }
            }
            _ => {}
        }
    }
}

fn check_ms1553_channels(
    data: &[u8],
    packets: &[ParsedPacket],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut last_ipts_by_channel: HashMap<u16, u64> = HashMap::new();

    for packet in packets {
        if packet.data_type != DATA_TYPE_MS1553_F1 {
            continue;
        }
        let payload = &data[packet.payload_offset..packet.payload_offset + packet.data_length as usize];
        if payload.len() < MS1553_CSDW_LEN {
            diagnostics.push(Diagnostic::error(
                "E_MS1553_SHORT_PAYLOAD",
                packet.offset,
                "MS1553-F1 payload shorter than its CSDW",
            ));
            continue;
        }
        let csdw = read_u32_le(&payload[0..]);
        let declared_count = csdw & 0x00FF_FFFF;

        let mut cursor = MS1553_CSDW_LEN;
        let mut actual_count: u32 = 0;
        while cursor + IPDH_LEN <= payload.len() {
            let ipdh = &payload[cursor..cursor + IPDH_LEN];
            let ipts = read_u64_le(&ipdh[0..]);
            let length_bytes = read_u16_le(&ipdh[14..]) as usize;

            if cursor + IPDH_LEN + length_bytes > payload.len() {
                diagnostics.push(Diagnostic::error(
                    "E_MS1553_BLOCK_TRUNCATED",
                    packet.offset + PACKET_HEADER_LEN + cursor,
                    "message block's declared length exceeds remaining payload",
                ));
                break;
            }

            let last_ipts = last_ipts_by_channel.entry(packet.channel_id).or_insert(0);
            if actual_count > 0 && ipts < *last_ipts {
                diagnostics.push(Diagnostic::error(
                    "E_IPTS_NOT_MONOTONIC",
                    packet.offset + PACKET_HEADER_LEN + cursor,
                    format!("IPTS {ipts} precedes previous value {last_ipts} on channel {}", packet.channel_id),
                ));
            }
            *last_ipts = ipts;

            let words_offset = cursor + IPDH_LEN;
            let command_word = if length_bytes >= 2 {
                read_u16_le(&payload[words_offset..])
            } else {
                0
            };
            let (_, _, _, wc) = decode_command_word(command_word);
            let wire_words = length_bytes / 2;
            if wire_words > 0 && wire_words < wc as usize && wc <= 32 {
                diagnostics.push(Diagnostic::warning(
                    "W_WC_WORD_MISMATCH",
                    packet.offset + PACKET_HEADER_LEN + words_offset,
                    format!("command word count {wc} exceeds the {wire_words} words present"),
                ));
            }

            cursor += IPDH_LEN + length_bytes;
            actual_count += 1;
        }

        if actual_count != declared_count {
            diagnostics.push(Diagnostic::error(
                "E_MESSAGE_COUNT_MISMATCH",
                packet.offset,
                format!("CSDW declares {declared_count} messages, found {actual_count}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ch10::packet::{build_packet, PacketHeader};

    fn header(channel_id: u16, data_type: u8) -> PacketHeader {
        PacketHeader {
            channel_id,
            data_type,
            data_type_version: 0,
            sequence_number: 0,
            packet_flags: 0,
            relative_time_counter: 0,
        }
    }

    #[test]
    fn empty_file_flags_missing_tmats() {
        let report = validate(&[]);
        assert!(!report.is_ok());
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == "E_NO_TMATS"));
    }

    #[test]
    fn single_tmats_packet_is_structurally_valid() {
        let packet = build_packet(header(0x000, DATA_TYPE_TMATS), &[0, 0, 0, 0]);
        let report = validate(&packet);
        assert!(!report
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error && d.code != "E_DATA_BEFORE_TIME"));
    }

    #[test]
    fn corrupted_sync_is_rejected() {
        let mut packet = build_packet(header(0x000, DATA_TYPE_TMATS), &[0, 0, 0, 0]);
        packet[0] = 0x00;
        let report = validate(&packet);
        assert!(report.diagnostics.iter().any(|d| d.code == "E_BAD_SYNC"));
    }

    #[test]
    fn tainted_checksum_is_rejected() {
        let mut packet = build_packet(header(0x000, DATA_TYPE_TMATS), &[0, 0, 0, 0]);
        packet[22] ^= 0xFF;
        let report = validate(&packet);
        assert!(report.diagnostics.iter().any(|d| d.code == "E_BAD_CHECKSUM"));
    }

    #[test]
    fn tmats_not_first_is_flagged() {
        let time_packet = build_packet(header(0x001, DATA_TYPE_TIME_F1), &[0; 12]);
        let tmats_packet = build_packet(header(0x000, DATA_TYPE_TMATS), &[0, 0, 0, 0]);
        let mut combined = time_packet;
        combined.extend_from_slice(&tmats_packet);
        let report = validate(&combined);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.code == "E_TMATS_NOT_FIRST"));
    }
}
