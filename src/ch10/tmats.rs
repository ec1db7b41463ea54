//! TMATS packet payload (spec §4.6): a minimal but schematically valid
//! semicolon-terminated key/value stream describing the recording, derived
//! from the ICD (spec §9 open question: body beyond the signature is not
//! fully specified, so we keep it minimal).

use crate::icd::{Bus, Icd, TransferDirection};
use std::fmt::Write as _;

/// Builds the TMATS payload: a 4-byte zero channel-specific data word
/// followed by the ASCII TMATS text (spec §4.6).
pub fn build_tmats_payload(icd: &Icd, program_name: &str) -> Vec<u8> {
    let text = build_tmats_text(icd, program_name);
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(text.as_bytes());
    payload
}

fn build_tmats_text(icd: &Icd, program_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "G\\PN:{program_name};");
    let _ = writeln!(out, "G\\DSI\\N:1;");
    let _ = writeln!(out, "G\\106:10;");

    let bus_letter = match icd.bus {
        Bus::A => "A",
        Bus::B => "B",
    };
    let _ = writeln!(out, "R-1\\BUS-1:1553{bus_letter};");

    for (idx, message) in icd.messages.iter().enumerate() {
        let n = idx + 1;
        let dir = match message.tr {
            TransferDirection::BcToRt => "BCRT",
            TransferDirection::RtToBc => "RTBC",
            TransferDirection::RtToRt => "RTRT",
            TransferDirection::ModeCode => "MC",
        };
        let _ = writeln!(out, "R-1\\1553-{n}\\ID:{};", message.name);
        let _ = writeln!(out, "R-1\\1553-{n}\\RT1:{};", message.rt);
        let _ = writeln!(out, "R-1\\1553-{n}\\SA1:{};", message.sa);
        let _ = writeln!(out, "R-1\\1553-{n}\\WC:{};", message.wc);
        let _ = writeln!(out, "R-1\\1553-{n}\\TYP:{dir};");
        let _ = writeln!(out, "R-1\\1553-{n}\\RATE:{};", message.rate_hz);
    }

    let _ = writeln!(out, "G\\106\\EOF;");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icd::load_icd_from_str;

    const ICD: &str = r#"
bus: A
messages:
  - name: AirData
    rate_hz: 20.0
    rt: 1
    tr: bc_to_rt
    sa: 1
    wc: 1
    words:
      - name: altitude
        encode: u16
"#;

    #[test]
    fn payload_starts_with_zero_csdw() {
        let icd = load_icd_from_str(ICD).unwrap();
        let payload = build_tmats_payload(&icd, "test");
        assert_eq!(&payload[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn text_includes_message_definitions() {
        let icd = load_icd_from_str(ICD).unwrap();
        let payload = build_tmats_payload(&icd, "test");
        let text = String::from_utf8(payload[4..].to_vec()).unwrap();
        assert!(text.contains("AirData"));
        assert!(text.ends_with("G\\106\\EOF;\n"));
    }
}
