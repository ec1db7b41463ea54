//! YAML ICD document parsing and validation (spec §4.2, §6).
//!
//! Recognized fields: `bus`, `messages[].{name, rate_hz, rt, tr, sa, wc,
//! words[]}`, `words[].{name, encode, src, const, scale, offset, min_value,
//! max_value, mask, shift, word_index, word_order}`.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use super::layout::compute_slots;
use super::model::{Bus, Field, Icd, IcdError, Message, TransferDirection};
use crate::codec::{Encoding, WordOrder};
use crate::error::Ch10GenError;

#[derive(Debug, Deserialize)]
struct RawIcd {
    name: Option<String>,
    bus: String,
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    name: String,
    rate_hz: f64,
    rt: u8,
    tr: String,
    sa: u8,
    wc: u8,
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
struct RawWord {
    name: String,
    encode: Option<String>,
    src: Option<String>,
    #[serde(rename = "const")]
    const_value: Option<f64>,
    scale: Option<f64>,
    offset: Option<f64>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    mask: Option<u16>,
    shift: Option<u32>,
    word_index: Option<usize>,
    word_order: Option<String>,
    digits: Option<u32>,
}

pub fn load_icd_from_file(path: &Path) -> Result<Icd, Ch10GenError> {
    let text = std::fs::read_to_string(path)?;
    load_icd_from_str(&text)
}

pub fn load_icd_from_str(text: &str) -> Result<Icd, Ch10GenError> {
    let raw: RawIcd = serde_yaml::from_str(text)?;
    build_icd(raw).map_err(|e| Ch10GenError::ConfigError {
        identifier: "icd".to_string(),
        reason: e.to_string(),
    })
}

fn build_icd(raw: RawIcd) -> Result<Icd, IcdError> {
    let bus = parse_bus(&raw.bus)?;

    let mut seen_names = HashSet::new();
    let mut messages = Vec::with_capacity(raw.messages.len());
    for raw_msg in raw.messages {
        if !seen_names.insert(raw_msg.name.clone()) {
            return Err(IcdError::InvalidMessageAddressing {
                message: raw_msg.name.clone(),
                reason: "duplicate message name".to_string(),
            });
        }
        messages.push(build_message(raw_msg)?);
    }

    Ok(Icd {
        name: raw.name.unwrap_or_else(|| "icd".to_string()),
        bus,
        messages,
    })
}

fn parse_bus(s: &str) -> Result<Bus, IcdError> {
    match s.to_ascii_uppercase().as_str() {
        "A" => Ok(Bus::A),
        "B" => Ok(Bus::B),
        other => Err(IcdError::InvalidMessageAddressing {
            message: "<icd>".to_string(),
            reason: format!("unknown bus designator '{other}', expected A or B"),
        }),
    }
}

fn parse_direction(message: &str, s: &str) -> Result<TransferDirection, IcdError> {
    match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
        "bc>rt" | "bctort" | "bc2rt" => Ok(TransferDirection::BcToRt),
        "rt>bc" | "rttobc" | "rt2bc" => Ok(TransferDirection::RtToBc),
        "rt>rt" | "rttort" | "rt2rt" => Ok(TransferDirection::RtToRt),
        "modecode" | "mc" => Ok(TransferDirection::ModeCode),
        other => Err(IcdError::InvalidMessageAddressing {
            message: message.to_string(),
            reason: format!("unknown transfer direction '{other}'"),
        }),
    }
}

fn build_message(raw: RawMessage) -> Result<Message, IcdError> {
    if raw.rt > 31 {
        return Err(IcdError::InvalidMessageAddressing {
            message: raw.name.clone(),
            reason: format!("rt={} out of range [0,31]", raw.rt),
        });
    }
    if raw.sa > 31 {
        return Err(IcdError::InvalidMessageAddressing {
            message: raw.name.clone(),
            reason: format!("sa={} out of range [0,31]", raw.sa),
        });
    }
    if raw.wc == 0 || raw.wc > 32 {
        return Err(IcdError::InvalidMessageAddressing {
            message: raw.name.clone(),
            reason: format!("wc={} out of range [1,32]", raw.wc),
        });
    }
    if raw.rate_hz <= 0.0 {
        return Err(IcdError::InvalidMessageAddressing {
            message: raw.name.clone(),
            reason: format!("rate_hz={} must be positive", raw.rate_hz),
        });
    }
    let tr = parse_direction(&raw.name, &raw.tr)?;

    let mut field_names = HashSet::new();
    let mut fields = Vec::with_capacity(raw.words.len());
    for word in raw.words {
        if !field_names.insert(word.name.clone()) {
            return Err(IcdError::DuplicateFieldName {
                message: raw.name.clone(),
                field: word.name,
            });
        }
        fields.push(build_field(&raw.name, word)?);
    }

    let slots = compute_slots(&raw.name, raw.wc, &fields)?;

    Ok(Message {
        name: raw.name,
        rate_hz: raw.rate_hz,
        rt: raw.rt,
        tr,
        sa: raw.sa,
        wc: raw.wc,
        fields,
        slots,
    })
}

fn build_field(message: &str, raw: RawWord) -> Result<Field, IcdError> {
    let encoding = parse_encoding(message, &raw)?;
    if raw.const_value.is_some() && raw.src.is_some() {
        return Err(IcdError::InvalidMessageAddressing {
            message: message.to_string(),
            reason: format!(
                "field '{}': const and src are mutually exclusive",
                raw.name
            ),
        });
    }
    Ok(Field {
        name: raw.name,
        encoding,
        scale: raw.scale.unwrap_or(1.0),
        offset: raw.offset.unwrap_or(0.0),
        min: raw.min_value,
        max: raw.max_value,
        const_value: raw.const_value,
        word_index: raw.word_index,
        mask: raw.mask,
        shift: raw.shift,
        source: raw.src,
    })
}

fn parse_encoding(message: &str, raw: &RawWord) -> Result<Encoding, IcdError> {
    let tag = raw.encode.as_deref().unwrap_or("u16");
    match tag.to_ascii_lowercase().as_str() {
        "u16" => Ok(Encoding::U16),
        "i16" => Ok(Encoding::I16),
        "bnr16" | "bnr" => Ok(Encoding::Bnr16),
        "bcd" => Ok(Encoding::Bcd {
            digits: raw.digits.unwrap_or(0),
        }),
        "float32_split" | "float32split" => {
            let word_order = match raw.word_order.as_deref() {
                None | Some("lsw_msw") | Some("lsw-msw") => WordOrder::LswMsw,
                Some("msw_lsw") | Some("msw-lsw") => WordOrder::MswLsw,
                Some(other) => {
                    return Err(IcdError::UnknownEncoding {
                        message: message.to_string(),
                        field: raw.name.clone(),
                        encoding: format!("float32_split word_order '{other}'"),
                    })
                }
            };
            Ok(Encoding::Float32Split { word_order })
        }
        other => Err(IcdError::UnknownEncoding {
            message: message.to_string(),
            field: raw.name.clone(),
            encoding: other.to_string(),
        }),
    }
}
