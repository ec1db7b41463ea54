//! # Scenario Model & Loader (C4)
//!
//! Parses a scenario document, validates it against an [`Icd`](crate::icd::Icd),
//! and resolves a `(message, field) -> generator` binding table (spec §4.4).

pub mod loader;
pub mod model;

pub use loader::{load_scenario_from_file, load_scenario_from_str};
pub use model::{BusConfig, JitterConfig, Scenario, ScenarioError};
