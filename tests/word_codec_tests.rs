use ch10gen::codec::command::{
    decode_command_word, decode_status_word, encode_command_word, encode_status_word,
    CommandDirection, StatusFlags,
};
use ch10gen::codec::{encode_scalar, pack_bitfield, Encoding, WordOrder};

#[test]
fn command_word_survives_a_bc_to_rt_round_trip() {
    let word = encode_command_word(12, CommandDirection::Receive, 3, 4);
    let (rt, is_transmit, sa, wc) = decode_command_word(word);
    assert_eq!((rt, is_transmit, sa, wc), (12, false, 3, 4));
}

#[test]
fn status_word_carries_rt_address_and_busy_flag() {
    let word = encode_status_word(9, StatusFlags::BUSY);
    let (rt, flags) = decode_status_word(word);
    assert_eq!(rt, 9);
    assert!(flags.contains(StatusFlags::BUSY));
    assert!(!flags.contains(StatusFlags::MESSAGE_ERROR));
}

#[test]
fn bnr16_scalar_applies_scale_and_offset_before_clamping() {
    let words = encode_scalar(123.45, Encoding::Bnr16, 0.01, 0.0, Some(0.0), Some(200.0)).unwrap();
    assert_eq!(words.len(), 1);
    // 123.45 / 0.01 = 12345, fits in i16 range
    assert_eq!(words[0] as i16, 12345);
}

#[test]
fn min_max_clip_happens_before_scale_offset() {
    // value clipped to max=200 before the bnr16 transform is applied
    let words = encode_scalar(9000.0, Encoding::Bnr16, 0.01, 0.0, Some(0.0), Some(200.0)).unwrap();
    assert_eq!(words[0] as i16, 20000);
}

#[test]
fn float32_split_occupies_two_words_in_declared_order() {
    let words = encode_scalar(-1.5, Encoding::Float32Split { word_order: WordOrder::MswLsw }, 1.0, 0.0, None, None).unwrap();
    assert_eq!(words.len(), 2);
    let bits = ((words[0] as u32) << 16) | (words[1] as u32);
    assert_eq!(f32::from_bits(bits), -1.5);
}

#[test]
fn two_bitfields_pack_into_one_word_without_clobbering_each_other() {
    let mut acc = 0u16;
    acc = pack_bitfield(acc, 7.0, Encoding::U16, 1.0, 0.0, 0x000F, 0).unwrap();
    acc = pack_bitfield(acc, 1.0, Encoding::U16, 1.0, 0.0, 0x0001, 4).unwrap();
    assert_eq!(acc, 0b0001_0111);
}
