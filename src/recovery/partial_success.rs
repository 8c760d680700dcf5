//! Partial success bookkeeping for one pricing pass

use crate::domain::RowId;
use crate::error::{ErrorCode, PipelineError};
use serde::Serialize;

/// A row that contributed no items because its calculator misbehaved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub row_id: RowId,
    pub code: ErrorCode,
    pub message: String,
}

/// A stage that handed its input through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFallback {
    pub stage: &'static str,
    pub code: ErrorCode,
    pub row_id: Option<RowId>,
    pub message: String,
}

/// What degraded during a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassDiagnostics {
    pub rows_priced: usize,
    pub rows_pending: usize,
    pub row_failures: Vec<RowFailure>,
    pub stage_fallbacks: Vec<StageFallback>,
    pub warnings: Vec<String>,
}

impl PassDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_priced_row(&mut self) {
        self.rows_priced += 1;
    }

    pub fn add_pending_row(&mut self) {
        self.rows_pending += 1;
    }

    pub fn add_row_failure(&mut self, error: &PipelineError) {
        self.row_failures.push(RowFailure {
            row_id: error
                .row_id()
                .cloned()
                .unwrap_or_else(|| RowId::new_unchecked("")),
            code: error.code(),
            message: error.to_string(),
        });
    }

    pub fn add_stage_fallback(&mut self, stage: &'static str, error: &PipelineError) {
        self.stage_fallbacks.push(StageFallback {
            stage,
            code: error.code(),
            row_id: error.row_id().cloned(),
            message: error.to_string(),
        });
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Nothing failed and nothing fell back.
    pub fn is_clean(&self) -> bool {
        self.row_failures.is_empty() && self.stage_fallbacks.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.row_failures.len() + self.stage_fallbacks.len()
    }
}
