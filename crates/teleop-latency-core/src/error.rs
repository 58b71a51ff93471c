//! # Error Module
//!
//! Every failure the engine can report. Resolution errors are fatal for the
//! scenario being resolved: the engine never retries and never substitutes
//! a default, because each one means the input table is incomplete or
//! malformed.

use crate::primitives::Scenario;
use thiserror::Error;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, LatencyError>;

/// Errors raised while ingesting a parameter table or resolving a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LatencyError {
    /// The named parameter is not in the table.
    #[error("parameter not found: '{name}'")]
    ParameterNotFound { name: String },

    /// The parameter exists but its column for this scenario is empty.
    #[error("parameter '{name}' has no value for scenario {scenario}")]
    ParameterValueMissing { name: String, scenario: Scenario },

    /// The parameter's cell is present but is not a finite number.
    #[error("parameter '{name}' has non-numeric value '{raw}' for scenario {scenario}")]
    InvalidParameterValue {
        name: String,
        scenario: Scenario,
        raw: String,
    },

    /// Two rows share a name; parameter names must be unique.
    #[error("duplicate parameter name: '{name}'")]
    DuplicateParameter { name: String },

    /// No row starting with `Parameter` was found.
    #[error("no header row found (expected a row whose first cell is 'Parameter')")]
    MissingHeader,

    /// The header row lacks a required column.
    #[error("header row is missing the '{0}' column")]
    MissingColumn(String),

    /// The table text could not be read as CSV/JSON.
    #[error("table error: {0}")]
    Table(String),

    #[error("unknown scenario: '{0}' (expected Best, Typical, Worst or Selected)")]
    UnknownScenario(String),

    #[error("unknown table format: '{0}' (expected csv or json)")]
    UnknownTableFormat(String),
}

impl LatencyError {
    /// The parameter name this error is about, if any.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            LatencyError::ParameterNotFound { name }
            | LatencyError::ParameterValueMissing { name, .. }
            | LatencyError::InvalidParameterValue { name, .. }
            | LatencyError::DuplicateParameter { name } => Some(name),
            _ => None,
        }
    }

    /// Whether this error came from resolving a scenario (as opposed to
    /// reading the table).
    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            LatencyError::ParameterNotFound { .. }
                | LatencyError::ParameterValueMissing { .. }
                | LatencyError::InvalidParameterValue { .. }
        )
    }
}

impl From<csv::Error> for LatencyError {
    fn from(err: csv::Error) -> Self {
        LatencyError::Table(err.to_string())
    }
}

impl From<serde_json::Error> for LatencyError {
    fn from(err: serde_json::Error) -> Self {
        LatencyError::Table(err.to_string())
    }
}
