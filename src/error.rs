//! Error handling for the estimate pricing pipeline
//!
//! This module provides:
//! - Error codes with stable categories for structured logs
//! - The `PipelineError` type returned by stages, calculators and loaders
//! - Context helpers for `anyhow` at the CLI boundary
//!
//! Nothing in a pricing pass is fatal: callers degrade on these errors
//! (skip the row, or keep a stage's input) and record them in
//! [`crate::recovery::PassDiagnostics`].

use crate::domain::{FieldName, ProductTypeId, RowId};
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A special row carries a value the stage cannot interpret
    InvalidFieldValue,
    /// A calculator reported completion without any components
    CalculatorContract,
    /// A calculator reported an error status
    CalculatorFailed,
    /// A row referenced by an item or a stage is not in the directory
    UnknownRow,
    /// A post-processing stage produced a non-finite amount
    NonFiniteAmount,
    /// Snapshot or config could not be decoded
    ParseError,
    /// File I/O error
    IoError,
}

impl ErrorCode {
    /// Error category used as the `category` field of log events
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFieldValue => "validation_error",
            ErrorCode::CalculatorContract | ErrorCode::CalculatorFailed => "calculator_error",
            ErrorCode::UnknownRow | ErrorCode::NonFiniteAmount => "stage_error",
            ErrorCode::ParseError => "client_error",
            ErrorCode::IoError => "io_error",
        }
    }

    /// Whether a pass that hit this error still produced a render-able preview
    pub fn is_degradable(&self) -> bool {
        !matches!(self, ErrorCode::ParseError | ErrorCode::IoError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// PIPELINE ERROR
// =============================================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("row {row_id} {field}: expected a number, found '{raw}'")]
    InvalidFieldValue {
        row_id: RowId,
        field: FieldName,
        raw: String,
    },

    #[error("calculator for product type {product_type_id} completed row {row_id} without components")]
    CalculatorContract {
        row_id: RowId,
        product_type_id: ProductTypeId,
    },

    #[error("calculator for product type {product_type_id} failed on row {row_id}: {message}")]
    CalculatorFailed {
        row_id: RowId,
        product_type_id: ProductTypeId,
        message: String,
    },

    #[error("row {0} is not present in the row directory")]
    UnknownRow(RowId),

    #[error("{stage} produced a non-finite amount for row {row_id}")]
    NonFiniteAmount { stage: &'static str, row_id: RowId },

    #[error("failed to decode {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {what}: {source}")]
    Yaml {
        what: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::InvalidFieldValue { .. } => ErrorCode::InvalidFieldValue,
            PipelineError::CalculatorContract { .. } => ErrorCode::CalculatorContract,
            PipelineError::CalculatorFailed { .. } => ErrorCode::CalculatorFailed,
            PipelineError::UnknownRow(_) => ErrorCode::UnknownRow,
            PipelineError::NonFiniteAmount { .. } => ErrorCode::NonFiniteAmount,
            PipelineError::Json { .. } | PipelineError::Yaml { .. } => ErrorCode::ParseError,
            PipelineError::Io(_) => ErrorCode::IoError,
        }
    }

    /// Row the error is attributed to, when there is one
    pub fn row_id(&self) -> Option<&RowId> {
        match self {
            PipelineError::InvalidFieldValue { row_id, .. }
            | PipelineError::CalculatorContract { row_id, .. }
            | PipelineError::CalculatorFailed { row_id, .. }
            | PipelineError::NonFiniteAmount { row_id, .. }
            | PipelineError::UnknownRow(row_id) => Some(row_id),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

// =============================================================================
// CONTEXT HELPERS
// =============================================================================

/// Extension trait for adding context to Results at the CLI boundary
pub trait ResultExt<T> {
    /// Add operation context
    fn with_operation(self, operation: &str) -> Result<T>;

    /// Add estimate context
    fn with_estimate(self, estimate_id: Option<i64>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_operation(self, operation: &str) -> Result<T> {
        self.with_context(|| format!("Operation '{}' failed", operation))
    }

    fn with_estimate(self, estimate_id: Option<i64>) -> Result<T> {
        self.with_context(|| match estimate_id {
            Some(id) => format!("Error in estimate {}", id),
            None => "Error in unsaved estimate".to_string(),
        })
    }
}
