//! The validated scenario model (spec §3 "Scenario", §4.4).

use crate::generator::GeneratorSpec;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Small value object carried to the writer (spec §3 "Bus configuration").
#[derive(Debug, Clone, PartialEq)]
pub struct BusConfig {
    pub packet_bytes_target: u32,
    pub time_packet_interval_s: f64,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            packet_bytes_target: crate::constants::DEFAULT_TARGET_PACKET_BYTES,
            time_packet_interval_s: crate::constants::DEFAULT_TIME_PACKET_INTERVAL_S,
        }
    }
}

/// Optional bounded jitter applied by the scheduler (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JitterConfig {
    pub max_jitter_ms: f64,
}

/// A fully validated scenario: a run's duration, RNG seed, bus parameters,
/// and the resolved `(message, field) -> generator` binding table.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub duration_seconds: f64,
    pub start_time_utc: Option<DateTime<Utc>>,
    pub seed: u64,
    pub bus: BusConfig,
    pub jitter: JitterConfig,
    pub bindings: HashMap<(String, String), GeneratorSpec>,
}

impl Scenario {
    pub fn generator_for(&self, message: &str, field: &str) -> Option<&GeneratorSpec> {
        self.bindings
            .get(&(message.to_string(), field.to_string()))
    }
}

/// Failure modes for scenario loading and binding (spec §4.4).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("scenario references unknown message '{0}'")]
    UnknownMessageReference(String),

    #[error("scenario references unknown field '{message}.{field}'")]
    UnknownFieldReference { message: String, field: String },

    #[error("invalid generator configuration for '{message}.{field}': {reason}")]
    InvalidGeneratorConfig {
        message: String,
        field: String,
        reason: String,
    },

    #[error("scenario duration_seconds must be positive, got {0}")]
    InvalidDuration(f64),
}
