//! YAML scenario document parsing and ICD binding (spec §4.4, §6).
//!
//! Recognized fields: `name`, `duration_s`, `start_time_utc`, `seed`,
//! `bus.{packet_bytes_target, time_packet_interval_s}`,
//! `defaults.{data_mode, default_config}`,
//! `messages[name].{default_mode, default_config, fields[name].{mode, ...}}`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::model::{BusConfig, JitterConfig, Scenario, ScenarioError};
use crate::error::Ch10GenError;
use crate::generator::{GeneratorSpec, Peak};
use crate::icd::Icd;

#[derive(Debug, Deserialize)]
struct RawScenario {
    name: Option<String>,
    duration_s: f64,
    start_time_utc: Option<DateTime<Utc>>,
    seed: Option<u64>,
    #[serde(default)]
    bus: RawBusConfig,
    #[serde(default)]
    jitter_ms: f64,
    #[serde(default)]
    defaults: Option<RawGeneratorSpec>,
    #[serde(default)]
    messages: HashMap<String, RawMessageOverrides>,
}

#[derive(Debug, Deserialize, Default)]
struct RawBusConfig {
    packet_bytes_target: Option<u32>,
    time_packet_interval_s: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawMessageOverrides {
    #[serde(default)]
    default_mode: Option<RawGeneratorSpec>,
    #[serde(default)]
    fields: HashMap<String, RawGeneratorSpec>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum RawGeneratorSpec {
    Constant {
        value: f64,
    },
    Increment {
        start: f64,
        step: f64,
        #[serde(default)]
        wrap: Option<f64>,
    },
    Pattern {
        values: Vec<f64>,
        #[serde(default)]
        repeat: bool,
    },
    Random {
        min: f64,
        max: f64,
    },
    RandomNormal {
        mean: f64,
        stddev: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    RandomMultimodal {
        peaks: Vec<RawPeak>,
    },
    RandomExponential {
        lambda: f64,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Sine {
        center: f64,
        amplitude: f64,
        frequency_hz: f64,
        #[serde(default)]
        phase_rad: f64,
    },
    Cosine {
        center: f64,
        amplitude: f64,
        frequency_hz: f64,
        #[serde(default)]
        phase_rad: f64,
    },
    Square {
        low: f64,
        high: f64,
        period_s: f64,
        #[serde(default = "default_duty")]
        duty: f64,
    },
    Sawtooth {
        min: f64,
        max: f64,
        period_s: f64,
    },
    Ramp {
        start: f64,
        end: f64,
        duration_s: f64,
        #[serde(default)]
        repeat: bool,
    },
    Expression {
        formula: String,
    },
}

fn default_duty() -> f64 {
    0.5
}

#[derive(Debug, Deserialize, Clone)]
struct RawPeak {
    mean: f64,
    stddev: f64,
    weight: f64,
}

fn to_generator_spec(
    message: &str,
    field: &str,
    raw: &RawGeneratorSpec,
) -> Result<GeneratorSpec, ScenarioError> {
    Ok(match raw.clone() {
        RawGeneratorSpec::Constant { value } => GeneratorSpec::Constant { value },
        RawGeneratorSpec::Increment { start, step, wrap } => {
            GeneratorSpec::Increment { start, step, wrap }
        }
        RawGeneratorSpec::Pattern { values, repeat } => {
            GeneratorSpec::Pattern { values, repeat }
        }
        RawGeneratorSpec::Random { min, max } => GeneratorSpec::Random { min, max },
        RawGeneratorSpec::RandomNormal {
            mean,
            stddev,
            min,
            max,
        } => GeneratorSpec::RandomNormal {
            mean,
            stddev,
            min,
            max,
        },
        RawGeneratorSpec::RandomMultimodal { peaks } => GeneratorSpec::RandomMultimodal {
            peaks: peaks
                .into_iter()
                .map(|p| Peak {
                    mean: p.mean,
                    stddev: p.stddev,
                    weight: p.weight,
                })
                .collect(),
        },
        RawGeneratorSpec::RandomExponential { lambda, min, max } => {
            GeneratorSpec::RandomExponential { lambda, min, max }
        }
        RawGeneratorSpec::Sine {
            center,
            amplitude,
            frequency_hz,
            phase_rad,
        } => GeneratorSpec::Sine {
            center,
            amplitude,
            frequency_hz,
            phase_rad,
        },
        RawGeneratorSpec::Cosine {
            center,
            amplitude,
            frequency_hz,
            phase_rad,
        } => GeneratorSpec::Cosine {
            center,
            amplitude,
            frequency_hz,
            phase_rad,
        },
        RawGeneratorSpec::Square {
            low,
            high,
            period_s,
            duty,
        } => GeneratorSpec::Square {
            low,
            high,
            period_s,
            duty,
        },
        RawGeneratorSpec::Sawtooth {
            min,
            max,
            period_s,
        } => GeneratorSpec::Sawtooth { min, max, period_s },
        RawGeneratorSpec::Ramp {
            start,
            end,
            duration_s,
            repeat,
        } => GeneratorSpec::Ramp {
            start,
            end,
            duration_s,
            repeat,
        },
        RawGeneratorSpec::Expression { formula } => {
            GeneratorSpec::parse_expression(&formula).map_err(|e| {
                ScenarioError::InvalidGeneratorConfig {
                    message: message.to_string(),
                    field: field.to_string(),
                    reason: e.to_string(),
                }
            })?
        }
    })
}

pub fn load_scenario_from_file(path: &Path, icd: &Icd) -> Result<Scenario, Ch10GenError> {
    let text = std::fs::read_to_string(path)?;
    load_scenario_from_str(&text, icd)
}

pub fn load_scenario_from_str(text: &str, icd: &Icd) -> Result<Scenario, Ch10GenError> {
    let raw: RawScenario = serde_yaml::from_str(text)?;
    build_scenario(raw, icd).map_err(|e| Ch10GenError::ConfigError {
        identifier: "scenario".to_string(),
        reason: e.to_string(),
    })
}

fn build_scenario(raw: RawScenario, icd: &Icd) -> Result<Scenario, ScenarioError> {
    if raw.duration_s <= 0.0 {
        return Err(ScenarioError::InvalidDuration(raw.duration_s));
    }

    for message_name in raw.messages.keys() {
        if icd.message(message_name).is_none() {
            return Err(ScenarioError::UnknownMessageReference(message_name.clone()));
        }
    }

    let mut bindings = HashMap::new();
    for message in &icd.messages {
        let overrides = raw.messages.get(&message.name);
        let message_default = overrides.and_then(|o| o.default_mode.as_ref());

        for field in &message.fields {
            if field.const_value.is_some() {
                continue;
            }
            let explicit = overrides.and_then(|o| o.fields.get(&field.name));
            let raw_spec = explicit
                .or(message_default)
                .or(raw.defaults.as_ref());

            let spec = match raw_spec {
                Some(raw_spec) => to_generator_spec(&message.name, &field.name, raw_spec)?,
                None => GeneratorSpec::Random {
                    min: encoding_default_min(field),
                    max: encoding_default_max(field),
                },
            };
            bindings.insert((message.name.clone(), field.name.clone()), spec);
        }

        if let Some(overrides) = overrides {
            for field_name in overrides.fields.keys() {
                if message.field(field_name).is_none() {
                    return Err(ScenarioError::UnknownFieldReference {
                        message: message.name.clone(),
                        field: field_name.clone(),
                    });
                }
            }
        }
    }

    Ok(Scenario {
        name: raw.name.unwrap_or_else(|| "scenario".to_string()),
        duration_seconds: raw.duration_s,
        start_time_utc: raw.start_time_utc,
        seed: raw.seed.unwrap_or(0),
        bus: BusConfig {
            packet_bytes_target: raw
                .bus
                .packet_bytes_target
                .unwrap_or(crate::constants::DEFAULT_TARGET_PACKET_BYTES),
            time_packet_interval_s: raw
                .bus
                .time_packet_interval_s
                .unwrap_or(crate::constants::DEFAULT_TIME_PACKET_INTERVAL_S),
        },
        jitter: JitterConfig {
            max_jitter_ms: raw.jitter_ms,
        },
        bindings,
    })
}

/// ICD-level implicit fallback for an unbound field: uniform random over the
/// field's natural encoding range (spec §4.4), narrowed by declared clip
/// bounds when present.
fn encoding_default_min(field: &crate::icd::Field) -> f64 {
    field.min.unwrap_or(crate::constants::I16_MIN)
}

fn encoding_default_max(field: &crate::icd::Field) -> f64 {
    field.max.unwrap_or(crate::constants::I16_MAX)
}
