//! # Writer / Flush Controller (C7)
//!
//! Accumulates encoded messages into size/time-bounded MS1553-F1 packets and
//! writes them, TMATS and Time-F1 packets, chronologically (spec §4.7).

use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

use crate::ch10::ms1553::{build_ms1553_payload, BlockStatus, MessageBlock, MessageWords};
use crate::ch10::packet::{build_packet, PacketHeader};
use crate::ch10::time::{build_time_payload, TimeFormat, TimeSource};
use crate::ch10::tmats::build_tmats_payload;
use crate::constants::{
    CHANNEL_ID_BUS_A, CHANNEL_ID_BUS_B, CHANNEL_ID_TIME, CHANNEL_ID_TMATS, DATA_TYPE_MS1553_F1,
    DATA_TYPE_TIME_F1, DATA_TYPE_TMATS, DEFAULT_TARGET_PACKET_BYTES,
    DEFAULT_TIME_PACKET_INTERVAL_S,
};
use crate::error::Ch10GenError;
use crate::icd::{Bus, Icd};

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub program_name: String,
    pub target_packet_bytes: u32,
    pub time_packet_interval_s: f64,
    pub channel_id_tmats: u16,
    pub channel_id_time: u16,
    pub channel_id_bus_a: u16,
    pub channel_id_bus_b: u16,
    pub start_time_utc: DateTime<Utc>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            program_name: "ch10gen".to_string(),
            target_packet_bytes: DEFAULT_TARGET_PACKET_BYTES,
            time_packet_interval_s: DEFAULT_TIME_PACKET_INTERVAL_S,
            channel_id_tmats: CHANNEL_ID_TMATS,
            channel_id_time: CHANNEL_ID_TIME,
            channel_id_bus_a: CHANNEL_ID_BUS_A,
            channel_id_bus_b: CHANNEL_ID_BUS_B,
            start_time_utc: Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}

/// One message ready for packetization, already encoded by C1/C3 (spec §3
/// "Encoded message").
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMessage {
    pub emit_time_ns: u64,
    pub bus: Bus,
    pub block_status: BlockStatus,
    pub words: MessageWords,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub packets_written: u64,
    pub messages_written: u64,
    pub bytes_written: u64,
}

struct ChannelState {
    sequence_number: u8,
    pending: Vec<MessageBlock>,
    pending_bytes: usize,
    last_ipts: Option<u64>,
}

impl ChannelState {
    fn new() -> Self {
        ChannelState {
            sequence_number: 0,
            pending: Vec::new(),
            pending_bytes: 0,
            last_ipts: None,
        }
    }

    fn next_sequence(&mut self) -> u8 {
        let seq = self.sequence_number;
        self.sequence_number = self.sequence_number.wrapping_add(1);
        seq
    }
}

/// Accumulates and flushes Chapter 10 packets onto a byte sink (spec §4.7).
pub struct Writer<W: Write> {
    sink: W,
    config: WriterConfig,
    bootstrapped: bool,
    last_time_packet_ns: Option<u64>,
    channels: HashMap<u16, ChannelState>,
    stats: WriteStats,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W, config: WriterConfig) -> Self {
        Writer {
            sink,
            config,
            bootstrapped: false,
            last_time_packet_ns: None,
            channels: HashMap::new(),
            stats: WriteStats::default(),
        }
    }

    fn channel_id_for(&self, bus: Bus) -> u16 {
        match bus {
            Bus::A => self.config.channel_id_bus_a,
            Bus::B => self.config.channel_id_bus_b,
        }
    }

    fn channel_mut(&mut self, channel_id: u16) -> &mut ChannelState {
        self.channels
            .entry(channel_id)
            .or_insert_with(ChannelState::new)
    }

    fn bootstrap(&mut self, icd: &Icd, first_time_ns: u64) -> Result<(), Ch10GenError> {
        let tmats_payload = build_tmats_payload(icd, &self.config.program_name);
        self.write_raw_packet(
            self.config.channel_id_tmats,
            DATA_TYPE_TMATS,
            first_time_ns,
            &tmats_payload,
        )?;
        self.write_time_packet(first_time_ns)?;
        self.bootstrapped = true;
        Ok(())
    }

    fn write_time_packet(&mut self, emit_time_ns: u64) -> Result<(), Ch10GenError> {
        let instant = self.config.start_time_utc
            + ChronoDuration::nanoseconds(emit_time_ns as i64);
        let payload = build_time_payload(instant, TimeSource::Internal, TimeFormat::IrigB);
        self.write_raw_packet(self.config.channel_id_time, DATA_TYPE_TIME_F1, emit_time_ns, &payload)?;
        self.last_time_packet_ns = Some(emit_time_ns);
        Ok(())
    }

    fn write_raw_packet(
        &mut self,
        channel_id: u16,
        data_type: u8,
        emit_time_ns: u64,
        payload: &[u8],
    ) -> Result<(), Ch10GenError> {
        let seq = self.channel_mut(channel_id).next_sequence();
        let header = PacketHeader {
            channel_id,
            data_type,
            data_type_version: 0,
            sequence_number: seq,
            packet_flags: 0,
            relative_time_counter: emit_time_ns,
        };
        let packet = build_packet(header, payload);
        self.sink.write_all(&packet)?;
        self.stats.packets_written += 1;
        self.stats.bytes_written += packet.len() as u64;
        Ok(())
    }

    /// Feeds one scheduled, encoded message into the writer (spec §4.7).
    pub fn write_message(&mut self, icd: &Icd, msg: EncodedMessage) -> Result<(), Ch10GenError> {
        if !self.bootstrapped {
            self.bootstrap(icd, msg.emit_time_ns)?;
        }

        let interval_ns = (self.config.time_packet_interval_s * 1e9) as u64;
        if let Some(last) = self.last_time_packet_ns {
            if msg.emit_time_ns.saturating_sub(last) >= interval_ns {
                self.flush_all_channels()?;
                self.write_time_packet(msg.emit_time_ns)?;
            }
        }

        let channel_id = self.channel_id_for(msg.bus);
        {
            let channel = self.channel_mut(channel_id);
            if let Some(last_ipts) = channel.last_ipts {
                if msg.emit_time_ns < last_ipts {
                    return Err(Ch10GenError::Other(format!(
                        "IPTS regression on channel {channel_id}: {} < {last_ipts} (scheduler bug)",
                        msg.emit_time_ns
                    )));
                }
            }
        }

        let raw_words = msg.words.to_raw_words();
        let block_len = crate::constants::IPDH_LEN + raw_words.len() * 2;

        let channel = self.channel_mut(channel_id);
        let usable_budget = (self.config.target_packet_bytes as usize)
            .saturating_sub(crate::constants::MS1553_CSDW_LEN);
        if !channel.pending.is_empty() && channel.pending_bytes + block_len > usable_budget {
            self.flush_channel(channel_id)?;
        }

        let channel = self.channel_mut(channel_id);
        channel.pending.push(MessageBlock {
            ipts: msg.emit_time_ns,
            block_status: msg.block_status,
            gap1_half_us: 4,
            gap2_half_us: 4,
            words: msg.words,
        });
        channel.pending_bytes += block_len;
        channel.last_ipts = Some(msg.emit_time_ns);
        self.stats.messages_written += 1;

        Ok(())
    }

    fn flush_channel(&mut self, channel_id: u16) -> Result<(), Ch10GenError> {
        let (blocks, last_ipts) = {
            let channel = self.channel_mut(channel_id);
            if channel.pending.is_empty() {
                return Ok(());
            }
            let blocks = std::mem::take(&mut channel.pending);
            channel.pending_bytes = 0;
            (blocks, channel.last_ipts.unwrap_or(0))
        };
        let payload = build_ms1553_payload(&blocks);
        self.write_raw_packet(channel_id, DATA_TYPE_MS1553_F1, last_ipts, &payload)
    }

    fn flush_all_channels(&mut self) -> Result<(), Ch10GenError> {
        let channel_ids: Vec<u16> = self.channels.keys().copied().collect();
        for channel_id in channel_ids {
            self.flush_channel(channel_id)?;
        }
        Ok(())
    }

    /// Flushes any remaining accumulated packets and returns final stats
    /// (spec §4.7 "end of stream" flush trigger).
    pub fn finish(mut self) -> Result<WriteStats, Ch10GenError> {
        self.flush_all_channels()?;
        self.sink.flush()?;
        Ok(self.stats)
    }
}
