//! # Protocol and File-Format Constants
//!
//! Fixed values from IRIG-106 Chapter 10 (§4.6) and MIL-STD-1553B (§4.1) that
//! are referenced from more than one module.

/// Packet sync pattern, the first two bytes of every Chapter 10 packet header.
pub const PACKET_SYNC: u16 = 0xEB25;

/// Channel-specific data types (§4.6).
pub const DATA_TYPE_TMATS: u8 = 0x01;
pub const DATA_TYPE_TIME_F1: u8 = 0x11;
pub const DATA_TYPE_MS1553_F1: u8 = 0x19;

/// Conventional channel IDs used when the bus config doesn't override them.
pub const CHANNEL_ID_TMATS: u16 = 0x000;
pub const CHANNEL_ID_TIME: u16 = 0x001;
pub const CHANNEL_ID_BUS_A: u16 = 0x002;
pub const CHANNEL_ID_BUS_B: u16 = 0x003;

/// Default target packet size in bytes (spec §3 bus configuration).
pub const DEFAULT_TARGET_PACKET_BYTES: u32 = 65_536;

/// Default interval between Time-F1 packets, in seconds.
pub const DEFAULT_TIME_PACKET_INTERVAL_S: f64 = 1.0;

/// Length of the common packet header, in bytes (§4.6).
pub const PACKET_HEADER_LEN: usize = 24;

/// Length of one IPDH block preceding each 1553 message (§4.6): 8-byte IPTS
/// + 2-byte block status + 2-byte gap1 + 2-byte gap2 + 2-byte data length.
pub const IPDH_LEN: usize = 16;

/// Length of the MS1553-F1 CSDW, in bytes.
pub const MS1553_CSDW_LEN: usize = 4;

/// Length of the Time-F1 CSDW, in bytes.
pub const TIME_CSDW_LEN: usize = 4;

/// Length of the Time-F1 time body, in bytes.
pub const TIME_BODY_LEN: usize = 8;

/// Wire cost of one 1553 word in bits: 3 sync, 16 data, 1 parity (§4.5).
pub const WORD_WIRE_BITS: u32 = 20;

/// The 16-bit range for u16 and BNR encodings.
pub const U16_MIN: f64 = 0.0;
pub const U16_MAX: f64 = 65_535.0;

/// The 16-bit range for i16 and BNR encodings.
pub const I16_MIN: f64 = -32_768.0;
pub const I16_MAX: f64 = 32_767.0;

/// Default number of BCD digits packed into one 16-bit word.
pub const DEFAULT_BCD_DIGITS: u32 = 4;
