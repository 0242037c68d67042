//! Error taxonomy for the cleaning and analysis pipeline
//!
//! Structural problems (a required column is absent, a declared column has
//! the wrong shape) abort a run. Row-level parse failures never surface
//! here: stages filter those rows and report counts instead.

use polars::error::PolarsError;
use thiserror::Error;

/// Errors raised by the pipeline stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A column required by a stage is absent from the table.
    #[error("[{stage}] required column '{column}' not found (available: {available:?})")]
    Schema {
        stage: &'static str,
        column: String,
        available: Vec<String>,
    },

    /// A declared column is missing or cannot be treated as its declared type.
    #[error("[coerce] column '{column}': {reason}")]
    Coercion { column: String, reason: String },

    /// Too few data points for an analytic computation to be meaningful.
    #[error("insufficient data for {operation}: {reason}")]
    InsufficientData {
        operation: &'static str,
        reason: String,
    },

    /// Regression input is empty or has no unique least-squares solution.
    #[error("degenerate regression input: {0}")]
    DegenerateInput(String),

    /// Configuration values are out of range or contradictory.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure inside polars while building or filtering a table.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn insufficient(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn coercion(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Coercion {
            column: column.into(),
            reason: reason.into(),
        }
    }
}
