//! MS1553-F1 packet payload: CSDW, IPDH, and raw message words (spec §4.6).

use crate::constants::{IPDH_LEN, MS1553_CSDW_LEN};
use crate::util::{write_u16_le, write_u32_le, write_u64_le};
use bitflags::bitflags;
use bytes::{BufMut, BytesMut};

bitflags! {
    /// IPDH block status word flags (spec §4.6).
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct BlockStatus: u16 {
        /// 0 = bus A, 1 = bus B.
        const BUS_B                   = 1 << 0;
        const WORD_COUNT_ERROR        = 1 << 1;
        const SYNC_ERROR              = 1 << 2;
        const WORD_COUNT_ERROR_IN_GAP = 1 << 3;
        const RESPONSE_TIMEOUT        = 1 << 4;
        const FORMAT_ERROR            = 1 << 5;
        const RT_TO_RT                = 1 << 6;
        const MESSAGE_ERROR           = 1 << 7;
        const BC_RECEIVED             = 1 << 8;
    }
}

/// One 1553 message's raw words, ordered per transfer direction (spec §4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum MessageWords {
    BcToRt {
        command: u16,
        data: Vec<u16>,
        status: u16,
    },
    RtToBc {
        command: u16,
        status: u16,
        data: Vec<u16>,
    },
    RtToRt {
        receive_command: u16,
        transmit_command: u16,
        transmit_status: u16,
        data: Vec<u16>,
        receive_status: u16,
    },
    ModeCode {
        command: u16,
        data: Option<u16>,
        status: u16,
    },
}

impl MessageWords {
    pub fn to_raw_words(&self) -> Vec<u16> {
        match self {
            MessageWords::BcToRt {
                command,
                data,
                status,
            } => {
                let mut words = vec![*command];
                words.extend_from_slice(data);
                words.push(*status);
                words
            }
            MessageWords::RtToBc {
                command,
                status,
                data,
            } => {
                let mut words = vec![*command, *status];
                words.extend_from_slice(data);
                words
            }
            MessageWords::RtToRt {
                receive_command,
                transmit_command,
                transmit_status,
                data,
                receive_status,
            } => {
                let mut words = vec![*receive_command, *transmit_command, *transmit_status];
                words.extend_from_slice(data);
                words.push(*receive_status);
                words
            }
            MessageWords::ModeCode {
                command,
                data,
                status,
            } => {
                let mut words = vec![*command];
                if let Some(d) = data {
                    words.push(*d);
                }
                words.push(*status);
                words
            }
        }
    }
}

/// One message block within an MS1553-F1 packet: its IPDH fields and words.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageBlock {
    /// Intra-packet time stamp, in RTC ticks.
    pub ipts: u64,
    pub block_status: BlockStatus,
    pub gap1_half_us: u16,
    pub gap2_half_us: u16,
    pub words: MessageWords,
}

fn build_ipdh(ipts: u64, block_status: BlockStatus, gap1: u16, gap2: u16, length_bytes: u16) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(IPDH_LEN);
    write_u64_le(&mut buf, ipts);
    write_u16_le(&mut buf, block_status.bits());
    write_u16_le(&mut buf, gap1);
    write_u16_le(&mut buf, gap2);
    write_u16_le(&mut buf, length_bytes);
    buf.to_vec()
}

fn build_csdw(message_count: u32, time_tag_bits: u8) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(MS1553_CSDW_LEN);
    let value = (message_count & 0x00FF_FFFF) | (((time_tag_bits & 0x3) as u32) << 30);
    write_u32_le(&mut buf, value);
    buf.to_vec()
}

/// Assembles the full MS1553-F1 payload: CSDW followed by each message's
/// IPDH + raw words, all little-endian (spec §4.6).
pub fn build_ms1553_payload(blocks: &[MessageBlock]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_slice(&build_csdw(blocks.len() as u32, 0));
    for block in blocks {
        let raw_words = block.words.to_raw_words();
        let length_bytes = (raw_words.len() * 2) as u16;
        buf.put_slice(&build_ipdh(
            block.ipts,
            block.block_status,
            block.gap1_half_us,
            block.gap2_half_us,
            length_bytes,
        ));
        for word in &raw_words {
            write_u16_le(&mut buf, *word);
        }
    }
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bc_to_rt_word_order_is_command_data_status() {
        let words = MessageWords::BcToRt {
            command: 0x1234,
            data: vec![0xAAAA, 0xBBBB],
            status: 0x5678,
        };
        assert_eq!(words.to_raw_words(), vec![0x1234, 0xAAAA, 0xBBBB, 0x5678]);
    }

    #[test]
    fn rt_to_bc_word_order_is_command_status_data() {
        let words = MessageWords::RtToBc {
            command: 0x1234,
            status: 0x5678,
            data: vec![0xAAAA],
        };
        assert_eq!(words.to_raw_words(), vec![0x1234, 0x5678, 0xAAAA]);
    }

    #[test]
    fn rt_to_rt_word_order_matches_spec() {
        let words = MessageWords::RtToRt {
            receive_command: 1,
            transmit_command: 2,
            transmit_status: 3,
            data: vec![4, 5],
            receive_status: 6,
        };
        assert_eq!(words.to_raw_words(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn csdw_packs_message_count_and_time_tag_bits() {
        let csdw = build_csdw(5, 2);
        let value = u32::from_le_bytes([csdw[0], csdw[1], csdw[2], csdw[3]]);
        assert_eq!(value & 0x00FF_FFFF, 5);
        assert_eq!((value >> 30) & 0x3, 2);
    }

    #[test]
    fn payload_length_matches_csdw_plus_blocks() {
        let block = MessageBlock {
            ipts: 100,
            block_status: BlockStatus::empty(),
            gap1_half_us: 4,
            gap2_half_us: 4,
            words: MessageWords::BcToRt {
                command: 1,
                data: vec![2, 3],
                status: 4,
            },
        };
        let payload = build_ms1553_payload(&[block]);
        assert_eq!(payload.len(), MS1553_CSDW_LEN + IPDH_LEN + 4 * 2);
    }

    #[test]
    fn ipdh_length_field_reflects_word_count() {
        let block = MessageBlock {
            ipts: 0,
            block_status: BlockStatus::BUS_B,
            gap1_half_us: 0,
            gap2_half_us: 0,
            words: MessageWords::RtToBc {
                command: 1,
                status: 2,
                data: vec![3, 4, 5],
            },
        };
        let payload = build_ms1553_payload(&[block]);
        let length_field_offset = MS1553_CSDW_LEN + 12;
        let length = u16::from_le_bytes([
            payload[length_field_offset],
            payload[length_field_offset + 1],
        ]);
        assert_eq!(length, 5 * 2);
    }
}
