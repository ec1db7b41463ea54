//! # ch10gen Error Handling
//!
//! This module defines the [`Ch10GenError`] enum, which represents the
//! different error types that can occur while loading configuration,
//! generating data, and writing a Chapter 10 file.

use thiserror::Error;

/// Represents the different error types that can occur in the ch10gen crate.
///
/// Validation findings produced by the post-write validator (§4.8) and
/// non-fatal schedule warnings (§4.5) are not part of this enum — they are
/// collected into run reports rather than propagated as failures.
#[derive(Debug, Error)]
pub enum Ch10GenError {
    /// Indicates the ICD or scenario document failed validation at load.
    #[error("config error in '{identifier}': {reason}")]
    ConfigError { identifier: String, reason: String },

    /// Indicates an undefined field reference or an expression dependency cycle.
    #[error("dependency error: {0}")]
    DependencyError(String),

    /// Indicates a value could not be represented in its target encoding.
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// Indicates an underlying byte-sink write failure.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Indicates the generation run was cancelled by the caller.
    #[error("generation cancelled")]
    Cancelled,

    /// A catch-all error for uncategorized cases.
    #[error("other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for Ch10GenError {
    fn from(err: std::io::Error) -> Self {
        Ch10GenError::IoError(err.to_string())
    }
}

impl From<serde_yaml::Error> for Ch10GenError {
    fn from(err: serde_yaml::Error) -> Self {
        Ch10GenError::ConfigError {
            identifier: "<document>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<crate::icd::IcdError> for Ch10GenError {
    fn from(err: crate::icd::IcdError) -> Self {
        Ch10GenError::ConfigError {
            identifier: "<icd>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<crate::scenario::ScenarioError> for Ch10GenError {
    fn from(err: crate::scenario::ScenarioError) -> Self {
        Ch10GenError::ConfigError {
            identifier: "<scenario>".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<crate::scheduler::SchedulerError> for Ch10GenError {
    fn from(err: crate::scheduler::SchedulerError) -> Self {
        Ch10GenError::Other(err.to_string())
    }
}

impl From<crate::generator::GeneratorError> for Ch10GenError {
    fn from(err: crate::generator::GeneratorError) -> Self {
        Ch10GenError::DependencyError(err.to_string())
    }
}

impl From<crate::codec::CodecError> for Ch10GenError {
    fn from(err: crate::codec::CodecError) -> Self {
        Ch10GenError::EncodingError(err.to_string())
    }
}

/// Recovery policy applied when a generated value cannot be represented in
/// its target encoding (spec §7 `EncodingError` handling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingRecoveryPolicy {
    /// Fail the run with an `EncodingError`.
    Strict,
    /// Clamp to the representable range and record a warning (default).
    #[default]
    Clamp,
    /// Wrap around the representable range and record a warning.
    Wrap,
}
