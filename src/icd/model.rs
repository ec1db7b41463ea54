//! # ICD Data Model (C2)
//!
//! The validated, immutable shape of an Interface Control Document after
//! loading (spec §3, §4.2). Field source paths are carried but not resolved
//! here — that happens per-message in the generator kernel (§4.3).

use crate::codec::{Encoding, WordOrder};
use thiserror::Error;

/// Which physical 1553 bus this ICD's messages ride on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    A,
    B,
}

/// Transfer direction of a message (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    BcToRt,
    RtToBc,
    RtToRt,
    ModeCode,
}

/// One field within a message's word list (spec §3 "Field").
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub encoding: Encoding,
    pub scale: f64,
    pub offset: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub const_value: Option<f64>,
    pub word_index: Option<usize>,
    pub mask: Option<u16>,
    pub shift: Option<u32>,
    /// Semantic path referenced by scenario bindings, e.g. `altitude`.
    pub source: Option<String>,
}

impl Field {
    pub fn is_bitfield(&self) -> bool {
        self.mask.is_some() && self.shift.is_some()
    }

    pub fn is_split(&self) -> bool {
        matches!(self.encoding, Encoding::Float32Split { .. })
    }

    pub fn word_order(&self) -> WordOrder {
        match self.encoding {
            Encoding::Float32Split { word_order } => word_order,
            _ => WordOrder::LswMsw,
        }
    }
}

/// One resolved word position in a message's slot layout (spec §3, §4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// A single field fills this whole word.
    Scalar(usize),
    /// The first (lower) word of a two-word split-float field.
    SplitFirst(usize),
    /// The second (upper) word of a two-word split-float field; the field
    /// index matches the paired `SplitFirst`.
    SplitSecond(usize),
    /// One or more bitfields share this word; indices are declaration order.
    Packed(Vec<usize>),
}

/// A fully validated, laid-out 1553 message (spec §3 "Message").
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub rate_hz: f64,
    pub rt: u8,
    pub tr: TransferDirection,
    pub sa: u8,
    pub wc: u8,
    pub fields: Vec<Field>,
    pub slots: Vec<Slot>,
}

impl Message {
    /// Wire word count: 32 encodes as 0, spec §3/§4.1.
    pub fn wire_word_count(&self) -> u8 {
        self.wc % 32
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A validated ICD: a named collection of messages plus a bus designator.
#[derive(Debug, Clone, PartialEq)]
pub struct Icd {
    pub name: String,
    pub bus: Bus,
    pub messages: Vec<Message>,
}

impl Icd {
    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }
}

/// Failure modes for ICD loading and layout resolution (spec §4.2).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IcdError {
    #[error("message '{message}' field '{field}': unknown encoding '{encoding}'")]
    UnknownEncoding {
        message: String,
        field: String,
        encoding: String,
    },

    #[error("message '{message}': slot widths sum to {actual} words, expected wc={expected}")]
    SlotCountMismatch {
        message: String,
        expected: u8,
        actual: usize,
    },

    #[error("message '{message}' word_index {word_index}: bitfield overlap between '{a}' and '{b}'")]
    BitfieldOverlap {
        message: String,
        word_index: usize,
        a: String,
        b: String,
    },

    #[error("message '{message}' field '{field}': invalid bitfield placement: {reason}")]
    InvalidBitfieldPlacement {
        message: String,
        field: String,
        reason: String,
    },

    #[error("message '{message}': duplicate field name '{field}'")]
    DuplicateFieldName { message: String, field: String },

    #[error("message '{message}': invalid addressing: {reason}")]
    InvalidMessageAddressing { message: String, reason: String },
}
