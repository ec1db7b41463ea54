//! # Data Generator Kernel (C3)
//!
//! Computes each field's value for each message emission (spec §4.3): a
//! closed set of waveform/random/pattern generators plus an expression
//! language for fields that derive from other fields.

pub mod expr;
pub mod rng;

use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use thiserror::Error;

/// Failure modes for the generator kernel (spec §4.3).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("undefined field reference '{0}'")]
    UndefinedFieldReference(String),

    #[error("circular dependency: {0}")]
    CircularDependency(String),

    #[error("expression parse error: {0}")]
    ExpressionParseError(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    pub mean: f64,
    pub stddev: f64,
    pub weight: f64,
}

/// One field's generator configuration (spec §4.3 table).
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorSpec {
    Constant {
        value: f64,
    },
    Increment {
        start: f64,
        step: f64,
        wrap: Option<f64>,
    },
    Pattern {
        values: Vec<f64>,
        repeat: bool,
    },
    Random {
        min: f64,
        max: f64,
    },
    RandomNormal {
        mean: f64,
        stddev: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    RandomMultimodal {
        peaks: Vec<Peak>,
    },
    RandomExponential {
        lambda: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    Sine {
        center: f64,
        amplitude: f64,
        frequency_hz: f64,
        phase_rad: f64,
    },
    Cosine {
        center: f64,
        amplitude: f64,
        frequency_hz: f64,
        phase_rad: f64,
    },
    Square {
        low: f64,
        high: f64,
        period_s: f64,
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
        repeat: bool,
    },
    Expression {
        formula: String,
        ast: expr::Expr,
    },
}

impl GeneratorSpec {
    pub fn parse_expression(formula: &str) -> Result<GeneratorSpec, GeneratorError> {
        let ast = expr::parse(formula)?;
        Ok(GeneratorSpec::Expression {
            formula: formula.to_string(),
            ast,
        })
    }

    /// Field names this generator depends on (only `Expression` has any).
    pub fn dependencies(&self) -> Vec<String> {
        match self {
            GeneratorSpec::Expression { ast, .. } => expr::dependencies(ast),
            _ => Vec::new(),
        }
    }
}

/// Per-emission evaluation context (spec §4.3).
pub struct EvalContext<'a> {
    pub time_seconds: f64,
    pub message_count: u64,
    pub values: &'a HashMap<String, f64>,
    pub rng: &'a mut ChaCha8Rng,
    pub warnings: &'a mut Vec<String>,
}

pub fn evaluate(spec: &GeneratorSpec, ctx: &mut EvalContext) -> Result<f64, GeneratorError> {
    use rand::Rng;
    let n = ctx.message_count as f64;
    match spec {
        GeneratorSpec::Constant { value } => Ok(*value),
        GeneratorSpec::Increment { start, step, wrap } => {
            let raw = start + step * n;
            Ok(match wrap {
                Some(w) if *w != 0.0 => raw.rem_euclid(*w),
                _ => raw,
            })
        }
        GeneratorSpec::Pattern { values, repeat } => {
            if values.is_empty() {
                return Err(GeneratorError::TypeMismatch(
                    "pattern generator requires at least one value".to_string(),
                ));
            }
            let idx = ctx.message_count as usize;
            if *repeat || idx < values.len() {
                Ok(values[idx % values.len()])
            } else {
                Ok(*values.last().unwrap())
            }
        }
        GeneratorSpec::Random { min, max } => Ok(ctx.rng.gen_range(*min..=*max)),
        GeneratorSpec::RandomNormal {
            mean,
            stddev,
            min,
            max,
        } => {
            let dist = Normal::new(*mean, stddev.max(1e-12))
                .map_err(|e| GeneratorError::TypeMismatch(e.to_string()))?;
            Ok(clip(dist.sample(ctx.rng), *min, *max))
        }
        GeneratorSpec::RandomMultimodal { peaks } => {
            if peaks.is_empty() {
                return Err(GeneratorError::TypeMismatch(
                    "random_multimodal requires at least one peak".to_string(),
                ));
            }
            let total_weight: f64 = peaks.iter().map(|p| p.weight).sum();
            let mut pick = ctx.rng.gen_range(0.0..total_weight.max(1e-12));
            let mut chosen = &peaks[0];
            for peak in peaks {
                if pick < peak.weight {
                    chosen = peak;
                    break;
                }
                pick -= peak.weight;
            }
            let dist = Normal::new(chosen.mean, chosen.stddev.max(1e-12))
                .map_err(|e| GeneratorError::TypeMismatch(e.to_string()))?;
            Ok(dist.sample(ctx.rng))
        }
        GeneratorSpec::RandomExponential { lambda, min, max } => {
            let dist = rand_distr::Exp::new(*lambda)
                .map_err(|e| GeneratorError::TypeMismatch(e.to_string()))?;
            Ok(clip(dist.sample(ctx.rng), *min, *max))
        }
        GeneratorSpec::Sine {
            center,
            amplitude,
            frequency_hz,
            phase_rad,
        } => Ok(center + amplitude * (2.0 * PI * frequency_hz * ctx.time_seconds + phase_rad).sin()),
        GeneratorSpec::Cosine {
            center,
            amplitude,
            frequency_hz,
            phase_rad,
        } => Ok(center + amplitude * (2.0 * PI * frequency_hz * ctx.time_seconds + phase_rad).cos()),
        GeneratorSpec::Square {
            low,
            high,
            period_s,
            duty,
        } => {
            if *period_s <= 0.0 {
                return Err(GeneratorError::TypeMismatch(
                    "square generator period_s must be positive".to_string(),
                ));
            }
            let phase = ctx.time_seconds.rem_euclid(*period_s);
            Ok(if phase < duty * period_s { *high } else { *low })
        }
        GeneratorSpec::Sawtooth { min, max, period_s } => {
            if *period_s <= 0.0 {
                return Err(GeneratorError::TypeMismatch(
                    "sawtooth generator period_s must be positive".to_string(),
                ));
            }
            let phase = ctx.time_seconds.rem_euclid(*period_s) / period_s;
            Ok(min + (max - min) * phase)
        }
        GeneratorSpec::Ramp {
            start,
            end,
            duration_s,
            repeat,
        } => {
            if *duration_s <= 0.0 {
                return Err(GeneratorError::TypeMismatch(
                    "ramp generator duration_s must be positive".to_string(),
                ));
            }
            let raw_phase = ctx.time_seconds / duration_s;
            let phase = if *repeat {
                raw_phase.rem_euclid(1.0)
            } else {
                raw_phase.min(1.0)
            };
            Ok(start + (end - start) * phase)
        }
        GeneratorSpec::Expression { ast, .. } => {
            let mut expr_ctx = expr::ExprContext {
                time_seconds: ctx.time_seconds,
                message_count: ctx.message_count,
                values: ctx.values,
                rng: ctx.rng,
                warnings: ctx.warnings,
            };
            expr::eval(ast, &mut expr_ctx)
        }
    }
}

fn clip(value: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut v = value;
    if let Some(lo) = min {
        v = v.max(lo);
    }
    if let Some(hi) = max {
        v = v.min(hi);
    }
    v
}

/// Topologically orders the `expression`-typed fields of one message by
/// static dependency analysis, detecting cycles (spec §4.3). Non-expression
/// fields are independent and may be evaluated in any order beforehand, so
/// they are not part of this ordering.
pub fn topo_sort_expressions(
    field_names: &[String],
    specs: &HashMap<String, GeneratorSpec>,
) -> Result<Vec<String>, GeneratorError> {
    let known: HashSet<&str> = field_names.iter().map(String::as_str).collect();
    let expression_fields: Vec<&String> = field_names
        .iter()
        .filter(|name| matches!(specs.get(*name), Some(GeneratorSpec::Expression { .. })))
        .collect();

    #[derive(PartialEq, Clone, Copy)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for name in &expression_fields {
        marks.insert(name.as_str(), Mark::Unvisited);
    }

    let mut order = Vec::with_capacity(expression_fields.len());

    fn visit<'a>(
        name: &'a str,
        specs: &'a HashMap<String, GeneratorSpec>,
        known: &HashSet<&'a str>,
        marks: &mut HashMap<&'a str, Mark>,
        order: &mut Vec<String>,
        stack: &mut Vec<String>,
    ) -> Result<(), GeneratorError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => {
                stack.push(name.to_string());
                return Err(GeneratorError::CircularDependency(stack.join(" -> ")));
            }
            _ => {}
        }
        marks.insert(name, Mark::InProgress);
        stack.push(name.to_string());

        if let Some(GeneratorSpec::Expression { .. }) = specs.get(name) {
            let spec = specs.get(name).unwrap();
            for dep in spec.dependencies() {
                if !known.contains(dep.as_str()) {
                    return Err(GeneratorError::UndefinedFieldReference(dep));
                }
                if matches!(specs.get(&dep), Some(GeneratorSpec::Expression { .. })) {
                    visit(&dep, specs, known, marks, order, stack)?;
                }
            }
        }

        stack.pop();
        marks.insert(name, Mark::Done);
        order.push(name.to_string());
        Ok(())
    }

    for name in &expression_fields {
        let mut stack = Vec::new();
        visit(name.as_str(), specs, &known, &mut marks, &mut order, &mut stack)?;
    }

    Ok(order)
}
