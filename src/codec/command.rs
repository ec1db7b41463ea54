//! Command and status word assembly (spec §4.1).

use bitflags::bitflags;

/// Transfer direction encoded in the command word's single T/R bit.
///
/// `Transmit` means the addressed remote terminal transmits (RT→BC or the
/// transmit half of an RT→RT transfer); `Receive` means it receives
/// (BC→RT or the receive half of an RT→RT transfer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandDirection {
    Receive,
    Transmit,
}

/// Assembles a command word: bits 15-11 = `rt`, bit 10 = T/R, bits 9-5 =
/// `sa`, bits 4-0 = `wc mod 32` (so a word count of 32 wire-encodes as 0).
pub fn encode_command_word(rt: u8, dir: CommandDirection, sa: u8, wc: u8) -> u16 {
    let rt_bits = ((rt & 0x1F) as u16) << 11;
    let tr_bit = match dir {
        CommandDirection::Transmit => 1u16 << 10,
        CommandDirection::Receive => 0,
    };
    let sa_bits = ((sa & 0x1F) as u16) << 5;
    let wc_bits = (wc % 32) as u16;
    rt_bits | tr_bit | sa_bits | wc_bits
}

bitflags! {
    /// Status word flag bits (spec §4.1). Bit 5 is reserved and always
    /// clear; `AcceptanceError`/`ParityError` occupy the two remaining
    /// reserved bits of the classic MIL-STD-1553B layout (see DESIGN.md for
    /// the rationale — the standard only defines 8 flag bits, the spec asks
    /// for 10).
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct StatusFlags: u16 {
        const MESSAGE_ERROR    = 1 << 10;
        const INSTRUMENTATION  = 1 << 9;
        const SERVICE_REQUEST  = 1 << 8;
        const ACCEPTANCE_ERROR = 1 << 7;
        const PARITY_ERROR     = 1 << 6;
        const BROADCAST_RECEIVED = 1 << 4;
        const BUSY             = 1 << 3;
        const SUBSYSTEM_FLAG    = 1 << 2;
        const DBCA              = 1 << 1;
        const TERMINAL_FLAG     = 1 << 0;
    }
}

/// Assembles a status word: bits 15-11 = `rt`, remaining bits are `flags`.
pub fn encode_status_word(rt: u8, flags: StatusFlags) -> u16 {
    (((rt & 0x1F) as u16) << 11) | flags.bits()
}

/// Splits a status word back into its RT address and flag bits (used by the
/// validator, spec §4.8, to check RT-address agreement with the command word).
pub fn decode_status_word(word: u16) -> (u8, StatusFlags) {
    let rt = ((word >> 11) & 0x1F) as u8;
    let flags = StatusFlags::from_bits_truncate(word & 0x07FF);
    (rt, flags)
}

/// Splits a command word back into `(rt, is_transmit, sa, word_count)`,
/// where `word_count` is already normalized (0 decodes to 32).
pub fn decode_command_word(word: u16) -> (u8, bool, u8, u8) {
    let rt = ((word >> 11) & 0x1F) as u8;
    let is_transmit = (word >> 10) & 0x1 == 1;
    let sa = ((word >> 5) & 0x1F) as u8;
    let wc_field = (word & 0x1F) as u8;
    let wc = if wc_field == 0 { 32 } else { wc_field };
    (rt, is_transmit, sa, wc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_word_bit_layout_matches_example_1() {
        // rt=1, tr=BC2RT (receive), sa=1, wc=1 -> 00001 0 00001 00001
        let word = encode_command_word(1, CommandDirection::Receive, 1, 1);
        let expected = (1u16 << 11) | (0u16 << 10) | (1u16 << 5) | 1u16;
        assert_eq!(word, expected);
        assert_eq!(word, 0b0000_1000_0010_0001);
    }

    #[test]
    fn command_word_wc32_encodes_as_zero() {
        let word = encode_command_word(5, CommandDirection::Transmit, 3, 32);
        assert_eq!(word & 0x1F, 0);
        let (_, _, _, wc) = decode_command_word(word);
        assert_eq!(wc, 32);
    }

    #[test]
    fn command_word_roundtrip() {
        let word = encode_command_word(17, CommandDirection::Transmit, 9, 4);
        let (rt, is_tx, sa, wc) = decode_command_word(word);
        assert_eq!((rt, is_tx, sa, wc), (17, true, 9, 4));
    }

    #[test]
    fn status_word_roundtrip() {
        let flags = StatusFlags::BUSY | StatusFlags::MESSAGE_ERROR;
        let word = encode_status_word(12, flags);
        let (rt, decoded_flags) = decode_status_word(word);
        assert_eq!(rt, 12);
        assert_eq!(decoded_flags, flags);
    }
}
