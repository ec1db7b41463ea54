//! Time-F1 packet payload (spec §4.6). The exact bit layout of the time body
//! for non-IRIG-B formats is left to the IRIG-106 standard by the spec; this
//! defaults to IRIG-B / internal time source and packs hour/minute/second/
//! millisecond/microsecond as BCD fields within the 8-byte body (day of year
//! is not carried — a deliberate simplification, see DESIGN.md).

use crate::codec::encode::{encode_bcd, decode_bcd};
use crate::constants::TIME_CSDW_LEN;
use crate::util::{write_u16_le, write_u32_le};
use bytes::BytesMut;
use chrono::{DateTime, Timelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    Internal,
    External,
    InternalFromRmm,
    ExternalFromRmm,
}

impl TimeSource {
    fn code(self) -> u8 {
        match self {
            TimeSource::Internal => 0,
            TimeSource::External => 1,
            TimeSource::InternalFromRmm => 2,
            TimeSource::ExternalFromRmm => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    IrigB,
    IrigA,
    IrigG,
    RealTimeClock,
    UtcFromGps,
}

impl TimeFormat {
    fn code(self) -> u8 {
        match self {
            TimeFormat::IrigB => 0,
            TimeFormat::IrigA => 1,
            TimeFormat::IrigG => 2,
            TimeFormat::RealTimeClock => 3,
            TimeFormat::UtcFromGps => 4,
        }
    }
}

/// Builds the Time-F1 CSDW + 8-byte BCD body for a wall-clock instant.
pub fn build_time_payload(
    instant: DateTime<Utc>,
    source: TimeSource,
    format: TimeFormat,
) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(TIME_CSDW_LEN + 8);
    let csdw = ((source.code() as u32) << 8) | format.code() as u32;
    write_u32_le(&mut buf, csdw);

    let micros = instant.nanosecond() / 1_000 % 1_000_000;
    let millis_bcd = encode_bcd((micros / 1_000) as f64, 3).unwrap_or(0);
    let micros_bcd = encode_bcd((micros % 1_000) as f64, 3).unwrap_or(0);
    let seconds_bcd = encode_bcd(instant.second() as f64, 2).unwrap_or(0);
    let minutes_bcd = encode_bcd(instant.minute() as f64, 2).unwrap_or(0);
    let hours_bcd = encode_bcd(instant.hour() as f64, 2).unwrap_or(0);

    write_u16_le(&mut buf, micros_bcd);
    write_u16_le(&mut buf, millis_bcd);
    write_u16_le(&mut buf, (minutes_bcd << 8) | seconds_bcd);
    write_u16_le(&mut buf, hours_bcd);
    buf.truncate(TIME_CSDW_LEN + 8);
    buf.to_vec()
}

/// Decodes the seconds/minutes/hours fields back out of a Time-F1 body, used
/// by tests to confirm the BCD packing round-trips.
pub fn decode_time_fields(payload: &[u8]) -> (u32, u32, u32) {
    let word2 = u16::from_le_bytes([payload[8], payload[9]]);
    let seconds = decode_bcd(word2 & 0x00FF, 2);
    let minutes = decode_bcd((word2 >> 8) & 0x00FF, 2);
    let word3 = u16::from_le_bytes([payload[10], payload[11]]);
    let hours = decode_bcd(word3 & 0x00FF, 2);
    (hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn time_payload_has_expected_length() {
        let instant = Utc.with_ymd_and_hms(2026, 7, 27, 12, 34, 56).unwrap();
        let payload = build_time_payload(instant, TimeSource::Internal, TimeFormat::IrigB);
        assert_eq!(payload.len(), TIME_CSDW_LEN + 8);
    }

    #[test]
    fn csdw_encodes_default_source_and_format_as_zero() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let payload = build_time_payload(instant, TimeSource::Internal, TimeFormat::IrigB);
        let csdw = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
        assert_eq!(csdw, 0);
    }

    #[test]
    fn hms_fields_roundtrip() {
        let instant = Utc.with_ymd_and_hms(2026, 7, 27, 12, 34, 56).unwrap();
        let payload = build_time_payload(instant, TimeSource::Internal, TimeFormat::IrigB);
        let (hours, minutes, seconds) = decode_time_fields(&payload);
        assert_eq!((hours, minutes, seconds), (12, 34, 56));
    }
}
