//! # ICD Model & Loader (C2)
//!
//! Parses and validates Interface Control Documents and resolves each
//! message's bitfield/scalar/split word layout (spec §4.2).

pub mod layout;
pub mod loader;
pub mod model;

pub use loader::{load_icd_from_file, load_icd_from_str};
pub use model::{Bus, Field, Icd, IcdError, Message, Slot, TransferDirection};
