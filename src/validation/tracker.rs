//! Per-cell validation state for one estimate sheet.
//!
//! The blocking flag is a cached summary: mutations do not touch it, and
//! [`ValidationStateTracker::update_blocking_status`] must run after every
//! batch of mutations. [`ValidationStateTracker::batch`] does that on drop.

use crate::domain::{FieldName, RowId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

type CellKey = (RowId, FieldName);

/// Diagnostic attached to one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellValidationEntry {
    pub message: String,
    #[serde(default)]
    pub expected_format: Option<String>,
    #[serde(default)]
    pub value: String,
}

impl CellValidationEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected_format: None,
            value: String::new(),
        }
    }

    pub fn expected(mut self, format: impl Into<String>) -> Self {
        self.expected_format = Some(format.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// Whole-row diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureErrorEntry {
    pub message: String,
    pub rule: String,
}

impl StructureErrorEntry {
    pub fn new(message: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rule: rule.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Error,
    Warning,
    Valid,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationStateTracker {
    cell_errors: BTreeMap<CellKey, CellValidationEntry>,
    cell_warnings: BTreeMap<CellKey, CellValidationEntry>,
    structure_errors: BTreeMap<RowId, StructureErrorEntry>,
    blocking: bool,
    stale: bool,
}

impl ValidationStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cell_error(&mut self, row_id: RowId, field: FieldName, entry: CellValidationEntry) {
        self.cell_errors.insert((row_id, field), entry);
        self.stale = true;
    }

    pub fn set_cell_warning(
        &mut self,
        row_id: RowId,
        field: FieldName,
        entry: CellValidationEntry,
    ) {
        self.cell_warnings.insert((row_id, field), entry);
        self.stale = true;
    }

    pub fn set_structure_error(&mut self, row_id: RowId, entry: StructureErrorEntry) {
        self.structure_errors.insert(row_id, entry);
        self.stale = true;
    }

    /// Removes every cell entry and the structure entry of one row.
    pub fn clear_row(&mut self, row_id: &RowId) {
        for field in FieldName::iter() {
            let key = (row_id.clone(), field);
            self.cell_errors.remove(&key);
            self.cell_warnings.remove(&key);
        }
        self.structure_errors.remove(row_id);
        self.stale = true;
    }

    pub fn clear_all(&mut self) {
        self.cell_errors.clear();
        self.cell_warnings.clear();
        self.structure_errors.clear();
        self.stale = true;
    }

    /// Recomputes the sheet-wide blocking flag from the current entries.
    pub fn update_blocking_status(&mut self) -> bool {
        self.blocking = !self.cell_errors.is_empty() || !self.structure_errors.is_empty();
        self.stale = false;
        debug!(
            blocking = self.blocking,
            cell_errors = self.cell_errors.len(),
            structure_errors = self.structure_errors.len(),
            warnings = self.cell_warnings.len(),
            "validation blocking status updated"
        );
        self.blocking
    }

    /// Last computed blocking flag. Warnings never block.
    pub fn has_blocking_errors(&self) -> bool {
        if self.stale {
            warn!(
                blocking = self.blocking,
                "blocking status read after unrecomputed mutations"
            );
        }
        self.blocking
    }

    /// Whether mutations happened since the last recompute.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn cell_state(&self, row_id: &RowId, field: FieldName) -> CellState {
        let key = (row_id.clone(), field);
        if self.cell_errors.contains_key(&key) {
            CellState::Error
        } else if self.cell_warnings.contains_key(&key) {
            CellState::Warning
        } else {
            CellState::Valid
        }
    }

    pub fn cell_error(&self, row_id: &RowId, field: FieldName) -> Option<&CellValidationEntry> {
        self.cell_errors.get(&(row_id.clone(), field))
    }

    pub fn cell_warning(&self, row_id: &RowId, field: FieldName) -> Option<&CellValidationEntry> {
        self.cell_warnings.get(&(row_id.clone(), field))
    }

    pub fn structure_error(&self, row_id: &RowId) -> Option<&StructureErrorEntry> {
        self.structure_errors.get(row_id)
    }

    /// Cell errors of one row, in field order.
    pub fn row_errors<'a>(
        &'a self,
        row_id: &'a RowId,
    ) -> impl Iterator<Item = (FieldName, &'a CellValidationEntry)> + 'a {
        self.cell_errors
            .iter()
            .filter(move |((row, _), _)| row == row_id)
            .map(|((_, field), entry)| (*field, entry))
    }

    pub fn error_count(&self) -> usize {
        self.cell_errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.cell_warnings.len()
    }

    pub fn structure_error_count(&self) -> usize {
        self.structure_errors.len()
    }

    /// Starts a mutation batch; the blocking flag is recomputed when the
    /// returned guard is dropped.
    pub fn batch(&mut self) -> ValidationBatch<'_> {
        ValidationBatch { tracker: self }
    }
}

/// Mutation scope over a [`ValidationStateTracker`].
pub struct ValidationBatch<'a> {
    tracker: &'a mut ValidationStateTracker,
}

impl Deref for ValidationBatch<'_> {
    type Target = ValidationStateTracker;

    fn deref(&self) -> &Self::Target {
        self.tracker
    }
}

impl DerefMut for ValidationBatch<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tracker
    }
}

impl Drop for ValidationBatch<'_> {
    fn drop(&mut self) {
        self.tracker.update_blocking_status();
    }
}
