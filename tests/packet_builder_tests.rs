use ch10gen::ch10::ms1553::{build_ms1553_payload, BlockStatus, MessageBlock, MessageWords};
use ch10gen::ch10::packet::{build_packet, PacketHeader};
use ch10gen::ch10::time::{build_time_payload, decode_time_fields, TimeFormat, TimeSource};
use ch10gen::constants::{DATA_TYPE_MS1553_F1, PACKET_SYNC};
use ch10gen::util::read_u16_le;
use chrono::{TimeZone, Utc};

fn sample_header(data_type: u8) -> PacketHeader {
    PacketHeader {
        channel_id: 0x0002,
        data_type,
        data_type_version: 1,
        sequence_number: 0,
        packet_flags: 0,
        relative_time_counter: 0,
    }
}

#[test]
fn a_full_ms1553_packet_round_trips_its_sync_and_checksum() {
    let block = MessageBlock {
        ipts: 4_000,
        block_status: BlockStatus::empty(),
        gap1_half_us: 4,
        gap2_half_us: 4,
        words: MessageWords::BcToRt {
            command: 0x0821,
            data: vec![1234],
            status: 0x0800,
        },
    };
    let payload = build_ms1553_payload(&[block]);
    let packet = build_packet(sample_header(DATA_TYPE_MS1553_F1), &payload);

    assert_eq!(read_u16_le(&packet[0..]), PACKET_SYNC);
    assert_eq!(packet[15], DATA_TYPE_MS1553_F1);

    let mut expected: u32 = 0;
    for chunk in packet[0..22].chunks_exact(2) {
        expected = expected.wrapping_add(u16::from_le_bytes([chunk[0], chunk[1]]) as u32);
    }
    assert_eq!(read_u16_le(&packet[22..]), (expected & 0xFFFF) as u16);
}

#[test]
fn time_payload_encodes_a_known_instant() {
    let instant = Utc.with_ymd_and_hms(2026, 1, 15, 13, 45, 30).unwrap();
    let payload = build_time_payload(instant, TimeSource::Internal, TimeFormat::IrigB);
    assert_eq!(payload.len(), 12); // 4-byte CSDW + 8-byte body
    let (hours, minutes, seconds) = decode_time_fields(&payload);
    assert_eq!((hours, minutes, seconds), (13, 45, 30));
}
