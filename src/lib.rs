//! # ch10gen - A Synthetic IRIG-106 Chapter 10 Recording Generator
//!
//! `ch10gen` produces IRIG-106 Chapter 10 recording files carrying synthetic
//! MIL-STD-1553B bus traffic, driven by an Interface Control Document (ICD)
//! describing the bus's messages and a scenario describing how each field's
//! value evolves over the recording's duration.
//!
//! ## Pipeline
//!
//! 1. [`icd`] loads and validates an ICD document into a fully laid-out
//!    [`icd::Icd`].
//! 2. [`scenario`] loads a scenario document and binds a
//!    [`generator::GeneratorSpec`] to every field.
//! 3. [`scheduler`] produces the time-ordered sequence of message emissions.
//! 4. [`generator`] evaluates each field's value for each emission.
//! 5. [`codec`] encodes field values into 1553 words.
//! 6. [`ch10`] and [`writer`] assemble and flush Chapter 10 packets.
//! 7. [`validator`] checks a written file's structural conformance.
//!
//! [`pipeline::generate`] wires all of the above into one synchronous call.

pub mod ch10;
pub mod codec;
pub mod constants;
pub mod error;
pub mod generator;
pub mod icd;
pub mod logging;
pub mod pipeline;
pub mod scenario;
pub mod scheduler;
pub mod util;
pub mod validator;
pub mod writer;

pub use crate::error::Ch10GenError;
pub use crate::logging::{init_logger, log_info};
pub use crate::pipeline::{generate, PipelineReport};
