use ch10gen::codec::Encoding;
use ch10gen::icd::{load_icd_from_str, Slot};

const TWO_MESSAGE_ICD: &str = r#"
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
      - name: status_hi
        encode: u16
        mask: 0x00FF
        shift: 0
        word_index: 1
      - name: status_lo
        encode: u16
        mask: 0xFF00
        shift: 8
        word_index: 1
  - name: NavSolution
    rate_hz: 5.0
    rt: 2
    tr: rt_to_bc
    sa: 4
    wc: 2
    words:
      - name: position
        encode: float32_split
"#;

#[test]
fn loads_two_messages_with_correct_addressing() {
    let icd = load_icd_from_str(TWO_MESSAGE_ICD).unwrap();
    assert_eq!(icd.messages.len(), 2);
    let nav = icd.message("NavSolution").unwrap();
    assert_eq!((nav.rt, nav.sa, nav.wc), (2, 4, 2));
}

#[test]
fn explicit_bitfields_share_one_word_without_overlap() {
    let icd = load_icd_from_str(TWO_MESSAGE_ICD).unwrap();
    let air = icd.message("AirData").unwrap();
    let packed_slots: Vec<&Slot> = air
        .slots
        .iter()
        .filter(|s| matches!(s, Slot::Packed(_)))
        .collect();
    assert_eq!(packed_slots.len(), 1);
    if let Slot::Packed(indices) = packed_slots[0] {
        assert_eq!(indices.len(), 2);
    }
}

#[test]
fn float32_split_field_occupies_two_slots() {
    let icd = load_icd_from_str(TWO_MESSAGE_ICD).unwrap();
    let nav = icd.message("NavSolution").unwrap();
    assert_eq!(nav.slots.len(), 2);
    assert!(matches!(nav.slots[0], Slot::SplitFirst(_)));
    assert!(matches!(nav.slots[1], Slot::SplitSecond(_)));
    assert_eq!(nav.field("position").unwrap().encoding, Encoding::Float32Split { word_order: ch10gen::codec::WordOrder::LswMsw });
}

#[test]
fn slot_count_mismatch_is_rejected() {
    let bad = r#"
bus: A
messages:
  - name: Bad
    rate_hz: 10.0
    rt: 1
    tr: bc_to_rt
    sa: 1
    wc: 3
    words:
      - name: only_one
        encode: u16
"#;
    assert!(load_icd_from_str(bad).is_err());
}
