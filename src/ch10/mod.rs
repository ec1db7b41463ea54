//! # Chapter 10 Packet Builder (C6)
//!
//! Assembles TMATS, Time-F1, and MS1553-F1 packets with their common
//! 24-byte header, CSDW, and IPDH structures (spec §4.6).

pub mod ms1553;
pub mod packet;
pub mod time;
pub mod tmats;

pub use packet::{build_packet, PacketHeader};
