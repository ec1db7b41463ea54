//! # Bus Scheduler (C5)
//!
//! Produces a finite, strictly time-increasing sequence of scheduled events
//! over `[0, duration)` (spec §4.5).

use crate::constants::WORD_WIRE_BITS;
use crate::icd::Icd;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// One scheduled message emission (spec §3 "Scheduled event").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub emit_time_ns: u64,
    pub message_index: usize,
    pub sequence_index: u64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    #[error(
        "jitter clamp could not preserve event ordering across {0} adjacent events \
         (implementation bound exceeded)"
    )]
    ScheduleOverlapUnresolvable(usize),
}

/// Non-fatal scheduling diagnostics (spec §4.5).
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleWarning {
    RateExceedsBusCapacity { second: u64, utilization: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    pub events: Vec<ScheduledEvent>,
    pub warnings: Vec<ScheduleWarning>,
    pub minor_frame_s: f64,
    pub major_frame_s: f64,
}

/// The implementation-defined bound on how many adjacent events a jitter
/// clamp may need to walk back through before giving up (spec §4.5).
const MAX_JITTER_REORDER_WINDOW: usize = 8;

/// Builds the time-ordered event stream for `[0, duration_seconds)`.
///
/// Messages are addressed by their index into `icd.messages`, which also
/// serves as the `declaration_order` tie-break key (spec §4.5).
pub fn build_schedule(
    icd: &Icd,
    duration_seconds: f64,
    max_jitter_ms: f64,
    seed: u64,
) -> Result<ScheduleReport, SchedulerError> {
    let duration_ns = (duration_seconds * NANOS_PER_SECOND as f64).round() as u64;

    let mut events: Vec<ScheduledEvent> = Vec::new();
    for (message_index, message) in icd.messages.iter().enumerate() {
        let period_ns = (NANOS_PER_SECOND as f64 / message.rate_hz).round() as u64;
        if period_ns == 0 {
            continue;
        }
        let mut k: u64 = 0;
        loop {
            let emit_time_ns = period_ns.saturating_mul(k);
            if emit_time_ns >= duration_ns {
                break;
            }
            events.push(ScheduledEvent {
                emit_time_ns,
                message_index,
                sequence_index: k,
            });
            k += 1;
        }
    }

    // Stable sort by (time, rt, sa, declaration_order); ties broken by the
    // sort's stability on message_index for equal (rt, sa) (spec §4.5).
    events.sort_by(|a, b| {
        let ma = &icd.messages[a.message_index];
        let mb = &icd.messages[b.message_index];
        a.emit_time_ns
            .cmp(&b.emit_time_ns)
            .then(ma.rt.cmp(&mb.rt))
            .then(ma.sa.cmp(&mb.sa))
            .then(a.message_index.cmp(&b.message_index))
    });

    if max_jitter_ms > 0.0 {
        apply_jitter(&mut events, max_jitter_ms, seed)?;
    }

    let warnings = compute_utilization_warnings(icd, duration_ns);
    let (minor_frame_s, major_frame_s) = frame_sizes(icd);

    Ok(ScheduleReport {
        events,
        warnings,
        minor_frame_s,
        major_frame_s,
    })
}

fn apply_jitter(
    events: &mut [ScheduledEvent],
    max_jitter_ms: f64,
    seed: u64,
) -> Result<(), SchedulerError> {
    let jitter_ns = (max_jitter_ms * 1_000_000.0).round() as i64;
    if jitter_ns == 0 {
        return Ok(());
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xA5A5_A5A5_A5A5_A5A5);

    for i in 0..events.len() {
        let delta: i64 = rng.gen_range(-jitter_ns..=jitter_ns);
        let mut proposed = events[i].emit_time_ns as i64 + delta;
        if proposed < 0 {
            proposed = 0;
        }

        // Never let this event's jitter move it at or before the previous
        // one; if it would, clamp it back toward the previous event's time,
        // walking back only within the bounded reorder window.
        if i > 0 {
            let prev = events[i - 1].emit_time_ns as i64;
            if proposed <= prev {
                let mut reclaimed = false;
                for back in 1..=MAX_JITTER_REORDER_WINDOW.min(i) {
                    let idx = i - back;
                    if events[idx].emit_time_ns as i64 <= prev {
                        reclaimed = true;
                        break;
                    }
                }
                if !reclaimed {
                    return Err(SchedulerError::ScheduleOverlapUnresolvable(
                        MAX_JITTER_REORDER_WINDOW,
                    ));
                }
                proposed = prev + 1;
            }
        }
        events[i].emit_time_ns = proposed as u64;
    }
    Ok(())
}

fn compute_utilization_warnings(icd: &Icd, duration_ns: u64) -> Vec<ScheduleWarning> {
    let total_seconds = (duration_ns / NANOS_PER_SECOND).max(1);
    let mut warnings = Vec::new();
    for second in 0..total_seconds {
        let mut bits_this_second: f64 = 0.0;
        for message in &icd.messages {
            let wire_words = message.wire_word_count() as f64;
            let bits_per_message = (2.0 + wire_words) * WORD_WIRE_BITS as f64;
            bits_this_second += message.rate_hz * bits_per_message;
        }
        let utilization = bits_this_second / 1_000_000.0; // 1 Mbit/s nominal 1553 bus
        if utilization > 1.0 {
            warnings.push(ScheduleWarning::RateExceedsBusCapacity {
                second,
                utilization,
            });
        }
    }
    warnings
}

fn frame_sizes(icd: &Icd) -> (f64, f64) {
    let periods_ns: Vec<u64> = icd
        .messages
        .iter()
        .filter(|m| m.rate_hz > 0.0)
        .map(|m| (NANOS_PER_SECOND as f64 / m.rate_hz).round() as u64)
        .filter(|&p| p > 0)
        .collect();
    if periods_ns.is_empty() {
        return (0.0, crate::constants::DEFAULT_TIME_PACKET_INTERVAL_S);
    }
    let gcd_ns = periods_ns.iter().copied().fold(periods_ns[0], gcd);
    let lcm_ns = periods_ns
        .iter()
        .copied()
        .fold(1u64, |acc, p| lcm(acc, p))
        .min(NANOS_PER_SECOND); // configured 1 s fallback cap (spec §4.5)
    (
        gcd_ns as f64 / NANOS_PER_SECOND as f64,
        lcm_ns as f64 / NANOS_PER_SECOND as f64,
    )
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        0
    } else {
        a / gcd(a, b) * b
    }
}
