//! Crate-wide error type.

use thiserror::Error;

use crate::engine::Phase;
use crate::isa::Opcode;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building models, compiling, or executing programs.
///
/// Everything except [`Error::NumericInstability`] and
/// [`Error::BackendUnavailable`] is a configuration error: fatal,
/// surfaced immediately and never retried. See [`Error::is_configuration`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{what} index {index} out of range for {size} units")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        size: usize,
    },

    #[error("{what} dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{opcode} not allowed in {phase} phase")]
    InvalidPhase { opcode: Opcode, phase: Phase },

    #[error("coefficients not normalized: max magnitude {max:e} exceeds operating range {range:e}")]
    Unnormalized { max: f64, range: f64 },

    #[error("numeric instability at step {step}, unit {unit}: activation {value}")]
    NumericInstability { step: u64, unit: usize, value: f64 },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("malformed program encoding: {0}")]
    Decode(String),
}

impl Error {
    /// Whether this error belongs to the configuration class.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_)
                | Error::IndexOutOfRange { .. }
                | Error::DimensionMismatch { .. }
                | Error::InvalidPhase { .. }
                | Error::Unnormalized { .. }
                | Error::Decode(_)
        )
    }
}
