use ch10gen::constants::{DATA_TYPE_MS1553_F1, IPDH_LEN, MS1553_CSDW_LEN, PACKET_HEADER_LEN};
use ch10gen::icd::load_icd_from_str;
use ch10gen::scenario::load_scenario_from_str;
use ch10gen::util::read_u16_le;
use ch10gen::validator::validate;
use ch10gen::writer::WriterConfig;

const ICD: &str = r#"
bus: A
messages:
  - name: AirData
    rate_hz: 20.0
    rt: 1
    tr: bc_to_rt
    sa: 1
    wc: 2
    words:
      - name: altitude
        encode: bnr16
        scale: 0.5
      - name: airspeed
        encode: u16
  - name: NavStatus
    rate_hz: 5.0
    rt: 2
    tr: rt_to_bc
    sa: 1
    wc: 1
    words:
      - name: mode
        encode: u16
"#;

const SCENARIO: &str = r#"
name: flight-profile
duration_s: 5.0
seed: 1234
messages:
  AirData:
    fields:
      altitude:
        mode: ramp
        start: 0.0
        end: 30000.0
        duration_s: 5.0
        repeat: false
      airspeed:
        mode: expression
        formula: "200 + altitude * 0.01"
  NavStatus:
    fields:
      mode:
        mode: pattern
        values: [1, 2, 3]
        repeat: true
"#;

#[test]
fn a_two_message_scenario_generates_a_structurally_valid_file() {
    let icd = load_icd_from_str(ICD).unwrap();
    let scenario = load_scenario_from_str(SCENARIO, &icd).unwrap();
    let mut sink = Vec::new();

    let report =
        ch10gen::generate(&icd, &scenario, WriterConfig::default(), &mut sink, None).unwrap();

    assert_eq!(report.stats.messages_written, 20 * 5 + 5 * 5);

    let validation = validate(&sink);
    assert!(
        validation.is_ok(),
        "validation errors: {:?}",
        validation
            .diagnostics
            .iter()
            .filter(|d| d.severity == ch10gen::validator::Severity::Error)
            .collect::<Vec<_>>()
    );
}

#[test]
fn the_same_seed_produces_byte_identical_output() {
    let icd = load_icd_from_str(ICD).unwrap();
    let scenario = load_scenario_from_str(SCENARIO, &icd).unwrap();

    let mut first = Vec::new();
    ch10gen::generate(&icd, &scenario, WriterConfig::default(), &mut first, None).unwrap();

    let mut second = Vec::new();
    ch10gen::generate(&icd, &scenario, WriterConfig::default(), &mut second, None).unwrap();

    assert_eq!(first, second);
}

#[test]
fn an_expression_field_tracks_its_dependency() {
    let icd = load_icd_from_str(ICD).unwrap();
    let scenario = load_scenario_from_str(SCENARIO, &icd).unwrap();
    let mut sink = Vec::new();
    ch10gen::generate(&icd, &scenario, WriterConfig::default(), &mut sink, None).unwrap();

    // airspeed = 200 + altitude * 0.01; at t=0 the ramp-driven altitude
    // starts at 0.0, so the very first AirData message's airspeed word
    // (the message with the lowest rt sorts first among same-time events)
    // should encode to exactly 200.
    let first_ms1553 = first_packet_payload(&sink, DATA_TYPE_MS1553_F1)
        .expect("a data packet should have been written");
    let words_offset = MS1553_CSDW_LEN + IPDH_LEN;
    // raw word order for a bc_to_rt message is command, altitude, airspeed, status.
    let airspeed_word = read_u16_le(&first_ms1553[words_offset + 2 * 2..]);
    assert_eq!(airspeed_word, 200);
}

/// Scans the written packet stream and returns the payload of the first
/// packet with the given data type.
fn first_packet_payload(sink: &[u8], data_type: u8) -> Option<Vec<u8>> {
    let mut offset = 0usize;
    while offset + PACKET_HEADER_LEN <= sink.len() {
        let packet_length = u32::from_le_bytes([
            sink[offset + 4],
            sink[offset + 5],
            sink[offset + 6],
            sink[offset + 7],
        ]) as usize;
        let data_length = u32::from_le_bytes([
            sink[offset + 8],
            sink[offset + 9],
            sink[offset + 10],
            sink[offset + 11],
        ]) as usize;
        if sink[offset + 15] == data_type {
            let payload_offset = offset + PACKET_HEADER_LEN;
            return Some(sink[payload_offset..payload_offset + data_length].to_vec());
        }
        offset += packet_length;
    }
    None
}
