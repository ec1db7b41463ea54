//! # Generation Pipeline (C9)
//!
//! Wires the ICD, scenario, scheduler, generator kernel, word codec, and
//! writer together into the single synchronous entry point described in
//! spec §5: schedule -> generate -> encode -> write, one event at a time.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use rand_chacha::ChaCha8Rng;

use crate::ch10::ms1553::{BlockStatus, MessageWords};
use crate::codec::command::{encode_command_word, encode_status_word, CommandDirection, StatusFlags};
use crate::codec::{encode_scalar, pack_bitfield};
use crate::error::Ch10GenError;
use crate::generator::{evaluate, rng::sub_rng, topo_sort_expressions, EvalContext, GeneratorSpec};
use crate::icd::{Icd, Message, Slot, TransferDirection};
use crate::scenario::Scenario;
use crate::scheduler::{build_schedule, ScheduleWarning};
use crate::writer::{EncodedMessage, WriteStats, Writer, WriterConfig};

/// Aggregated outcome of one generation run (spec §5).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub stats: WriteStats,
    pub schedule_warnings: Vec<ScheduleWarning>,
    pub generator_warnings: Vec<String>,
}

/// Runs one complete generation pass: builds the schedule, evaluates every
/// field of every scheduled message, encodes the words, and streams packets
/// to `sink` (spec §5). `cancel`, if set, is polled between messages; when
/// it reads `true` the writer flushes whatever it has buffered and the call
/// returns `Ch10GenError::Cancelled`.
pub fn generate<W: Write>(
    icd: &Icd,
    scenario: &Scenario,
    writer_config: WriterConfig,
    sink: W,
    cancel: Option<&AtomicBool>,
) -> Result<PipelineReport, Ch10GenError> {
    let schedule = build_schedule(
        icd,
        scenario.duration_seconds,
        scenario.jitter.max_jitter_ms,
        scenario.seed,
    )?;

    let mut rngs: HashMap<(String, String), ChaCha8Rng> = HashMap::new();
    let mut generator_warnings = Vec::new();
    let mut writer = Writer::new(sink, writer_config);

    for event in &schedule.events {
        if let Some(flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                writer.finish()?;
                return Err(Ch10GenError::Cancelled);
            }
        }

        let message = &icd.messages[event.message_index];
        let time_seconds = event.emit_time_ns as f64 / 1_000_000_000.0;

        let values = evaluate_message_fields(
            scenario,
            message,
            time_seconds,
            event.sequence_index,
            &mut rngs,
            &mut generator_warnings,
        )?;

        let raw_words = encode_message_words(message, &values)?;
        let words = assemble_words(message, raw_words);
        let block_status = block_status_for(message);

        writer.write_message(
            icd,
            EncodedMessage {
                emit_time_ns: event.emit_time_ns,
                bus: icd.bus,
                block_status,
                words,
            },
        )?;
    }

    let stats = writer.finish()?;
    Ok(PipelineReport {
        stats,
        schedule_warnings: schedule.warnings,
        generator_warnings,
    })
}

/// Evaluates every field of one message emission: non-expression fields in
/// declaration order, then expression fields in dependency order (spec
/// §4.3). Each `(message, field)` keeps its own persistent RNG stream across
/// the whole run so successive random draws are independent.
fn evaluate_message_fields(
    scenario: &Scenario,
    message: &Message,
    time_seconds: f64,
    message_count: u64,
    rngs: &mut HashMap<(String, String), ChaCha8Rng>,
    generator_warnings: &mut Vec<String>,
) -> Result<HashMap<String, f64>, Ch10GenError> {
    let field_names: Vec<String> = message.fields.iter().map(|f| f.name.clone()).collect();

    // Constant-valued fields carry their value directly (spec §3 `const`)
    // and have no generator binding at all.
    let mut values: HashMap<String, f64> = HashMap::new();
    let mut specs: HashMap<String, GeneratorSpec> = HashMap::new();
    for field in &message.fields {
        if let Some(constant) = field.const_value {
            values.insert(field.name.clone(), constant);
            continue;
        }
        let spec = scenario
            .generator_for(&message.name, &field.name)
            .cloned()
            .ok_or_else(|| {
                Ch10GenError::DependencyError(format!(
                    "no generator bound for '{}.{}'",
                    message.name, field.name
                ))
            })?;
        specs.insert(field.name.clone(), spec);
    }

    let order = topo_sort_expressions(&field_names, &specs)?;
    let expression_fields: std::collections::HashSet<&String> = order.iter().collect();
    let mut eval_order: Vec<String> = field_names
        .iter()
        .filter(|n| !expression_fields.contains(n) && !values.contains_key(*n))
        .cloned()
        .collect();
    eval_order.extend(order);

    for name in eval_order {
        let spec = &specs[&name];
        let rng = rngs
            .entry((message.name.clone(), name.clone()))
            .or_insert_with(|| sub_rng(scenario.seed, &message.name, &name));
        let mut ctx = EvalContext {
            time_seconds,
            message_count,
            values: &values,
            rng,
            warnings: generator_warnings,
        };
        let value = evaluate(spec, &mut ctx)?;
        values.insert(name, value);
    }

    Ok(values)
}

/// Encodes every field's value into its slot's words, producing the
/// message's full wire word array in slot order (spec §4.2, §4.1).
fn encode_message_words(
    message: &Message,
    values: &HashMap<String, f64>,
) -> Result<Vec<u16>, Ch10GenError> {
    let mut words = Vec::with_capacity(message.slots.len());
    for slot in &message.slots {
        match slot {
            Slot::Scalar(field_idx) => {
                let field = &message.fields[*field_idx];
                let value = field_value(field, values);
                let mut encoded = encode_scalar(
                    value,
                    field.encoding,
                    field.scale,
                    field.offset,
                    field.min,
                    field.max,
                )?;
                words.append(&mut encoded);
            }
            Slot::SplitFirst(field_idx) => {
                let field = &message.fields[*field_idx];
                let value = field_value(field, values);
                let encoded = encode_scalar(
                    value,
                    field.encoding,
                    field.scale,
                    field.offset,
                    field.min,
                    field.max,
                )?;
                words.push(encoded[0]);
            }
            Slot::SplitSecond(field_idx) => {
                let field = &message.fields[*field_idx];
                let value = field_value(field, values);
                let encoded = encode_scalar(
                    value,
                    field.encoding,
                    field.scale,
                    field.offset,
                    field.min,
                    field.max,
                )?;
                words.push(encoded[1]);
            }
            Slot::Packed(field_indices) => {
                let mut acc = 0u16;
                for field_idx in field_indices {
                    let field = &message.fields[*field_idx];
                    let value = field_value(field, values);
                    let mask = field.mask.unwrap_or(0xFFFF);
                    let shift = field.shift.unwrap_or(0);
                    acc = pack_bitfield(
                        acc,
                        value,
                        field.encoding,
                        field.scale,
                        field.offset,
                        mask,
                        shift,
                    )?;
                }
                words.push(acc);
            }
        }
    }
    Ok(words)
}

fn field_value(field: &crate::icd::Field, values: &HashMap<String, f64>) -> f64 {
    values.get(&field.name).copied().unwrap_or(0.0)
}

/// Assembles one message's raw data words into its full command/status word
/// set, word-ordered per transfer direction (spec §4.6).
///
/// RT-to-RT transfers are addressed by a single `(rt, sa)` pair in the ICD
/// model (spec §3); the receiving and transmitting terminals are not
/// distinguished, so the same address is used for both command words (see
/// DESIGN.md).
fn assemble_words(message: &Message, data: Vec<u16>) -> MessageWords {
    let rt = message.rt;
    let sa = message.sa;
    let wc = message.wire_word_count();

    match message.tr {
        TransferDirection::BcToRt => {
            let command = encode_command_word(rt, CommandDirection::Receive, sa, wc);
            let status = encode_status_word(rt, StatusFlags::empty());
            MessageWords::BcToRt {
                command,
                data,
                status,
            }
        }
        TransferDirection::RtToBc => {
            let command = encode_command_word(rt, CommandDirection::Transmit, sa, wc);
            let status = encode_status_word(rt, StatusFlags::empty());
            MessageWords::RtToBc {
                command,
                status,
                data,
            }
        }
        TransferDirection::RtToRt => {
            let receive_command = encode_command_word(rt, CommandDirection::Receive, sa, wc);
            let transmit_command = encode_command_word(rt, CommandDirection::Transmit, sa, wc);
            let transmit_status = encode_status_word(rt, StatusFlags::empty());
            let receive_status = encode_status_word(rt, StatusFlags::empty());
            MessageWords::RtToRt {
                receive_command,
                transmit_command,
                transmit_status,
                data,
                receive_status,
            }
        }
        TransferDirection::ModeCode => {
            let has_data = !data.is_empty();
            let dir = if has_data {
                CommandDirection::Transmit
            } else {
                CommandDirection::Receive
            };
            let command = encode_command_word(rt, dir, sa, wc);
            let status = encode_status_word(rt, StatusFlags::empty());
            MessageWords::ModeCode {
                command,
                data: data.into_iter().next(),
                status,
            }
        }
    }
}

fn block_status_for(message: &Message) -> BlockStatus {
    match message.tr {
        TransferDirection::RtToRt => BlockStatus::RT_TO_RT,
        _ => BlockStatus::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icd::load_icd_from_str;
    use crate::scenario::load_scenario_from_str;

    const ICD: &str = r#"
bus: A
messages:
  - name: AirData
    rate_hz: 10.0
    rt: 1
    tr: bc_to_rt
    sa: 1
    wc: 2
    words:
      - name: altitude
        encode: u16
      - name: airspeed
        encode: u16
"#;

    const SCENARIO: &str = r#"
name: smoke
duration_s: 1.0
seed: 42
messages:
  AirData:
    fields:
      altitude:
        mode: constant
        value: 1000
      airspeed:
        mode: increment
        start: 100
        step: 1
"#;

    #[test]
    fn generates_expected_message_and_packet_counts() {
        let icd = load_icd_from_str(ICD).unwrap();
        let scenario = load_scenario_from_str(SCENARIO, &icd).unwrap();
        let mut sink = Vec::new();
        let report = generate(&icd, &scenario, WriterConfig::default(), &mut sink, None).unwrap();
        assert_eq!(report.stats.messages_written, 10);
        assert!(report.stats.packets_written >= 3);
        assert!(!sink.is_empty());
    }

    #[test]
    fn cancellation_stops_the_run_early() {
        let icd = load_icd_from_str(ICD).unwrap();
        let scenario = load_scenario_from_str(SCENARIO, &icd).unwrap();
        let mut sink = Vec::new();
        let cancel = AtomicBool::new(true);
        let err = generate(&icd, &scenario, WriterConfig::default(), &mut sink, Some(&cancel))
            .unwrap_err();
        assert!(matches!(err, Ch10GenError::Cancelled));
    }
}
