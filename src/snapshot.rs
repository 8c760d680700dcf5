//! Sheet snapshots: a frozen copy of the grid, its context, recorded
//! calculator results and any validation findings from the host.

use crate::domain::{FieldCell, FieldName, ProductTypeId, RowId};
use crate::error::{PipelineError, PipelineResult};
use crate::logging::snapshot_span;
use crate::model::{CalculationResult, PricingContext, Row};
use crate::pricing::{CalculatorRegistry, RecordedCalculator};
use crate::validation::{
    CellValidationEntry, FieldRuleReport, StructureErrorEntry, ValidationError,
    ValidationStateTracker, validate_special_rows, validate_unique_row_ids,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

pub const RULE_UNIQUE_ROW_ID: &str = "unique_row_id";

/// A cell as written in a snapshot: the raw text, or an explicit option pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SnapshotCell {
    Raw(String),
    Option { option: String },
}

impl From<SnapshotCell> for FieldCell {
    fn from(cell: SnapshotCell) -> Self {
        match cell {
            SnapshotCell::Raw(raw) => FieldCell::from_raw(raw),
            SnapshotCell::Option { option } => FieldCell::option(option),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotRow {
    pub row_id: RowId,
    pub product_type_id: ProductTypeId,
    #[serde(default)]
    pub product_type_name: String,
    #[serde(default)]
    pub display_number: String,
    #[serde(default)]
    pub fields: BTreeMap<FieldName, SnapshotCell>,
}

impl From<SnapshotRow> for Row {
    fn from(row: SnapshotRow) -> Self {
        Row {
            row_id: row.row_id,
            product_type_id: row.product_type_id,
            product_type_name: row.product_type_name,
            display_number: row.display_number,
            fields: row
                .fields
                .into_iter()
                .map(|(field, cell)| (field, cell.into()))
                .collect(),
        }
    }
}

/// Validation finding recorded by the host before the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotFinding {
    CellError {
        row_id: RowId,
        field: FieldName,
        message: String,
        #[serde(default)]
        expected_format: Option<String>,
        #[serde(default)]
        value: String,
    },
    CellWarning {
        row_id: RowId,
        field: FieldName,
        message: String,
        #[serde(default)]
        expected_format: Option<String>,
        #[serde(default)]
        value: String,
    },
    StructureError {
        row_id: RowId,
        message: String,
        rule: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SheetSnapshot {
    #[serde(default)]
    pub context: PricingContext,
    pub rows: Vec<SnapshotRow>,
    /// Calculator output per row id, replayed during the pass.
    #[serde(default)]
    pub calculations: BTreeMap<RowId, CalculationResult>,
    #[serde(default)]
    pub validation: Vec<SnapshotFinding>,
}

impl SheetSnapshot {
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        serde_json::from_str(json).map_err(|source| PipelineError::Json {
            what: "sheet snapshot",
            source,
        })
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let span = snapshot_span(&path.display().to_string());
        let _entered = span.enter();
        let contents = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&contents)?;
        debug!(
            rows = snapshot.rows.len(),
            calculations = snapshot.calculations.len(),
            findings = snapshot.validation.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows.iter().cloned().map(Row::from).collect()
    }

    /// Replays the recorded results for every regular product type.
    pub fn registry(&self) -> CalculatorRegistry {
        let mut registry = CalculatorRegistry::new();
        registry.set_fallback(Arc::new(RecordedCalculator::new(self.calculations.clone())));
        registry
    }

    /// Builds the tracker for a pass: host findings, duplicate row ids and
    /// the special-row field rules. The blocking flag is up to date on return.
    pub fn tracker(&self, rows: &[Row]) -> (ValidationStateTracker, FieldRuleReport) {
        let mut tracker = ValidationStateTracker::new();
        {
            let mut batch = tracker.batch();
            for finding in &self.validation {
                apply_finding(&mut batch, finding);
            }
            if let Err(ValidationError::DuplicateRowId { row_id }) =
                validate_unique_row_ids(rows.iter().map(|row| row.row_id.as_str()))
            {
                warn!(%row_id, "duplicate row id in snapshot");
                batch.set_structure_error(
                    RowId::new_unchecked(row_id),
                    StructureErrorEntry::new("Row id appears more than once", RULE_UNIQUE_ROW_ID),
                );
            }
        }
        let report = validate_special_rows(rows, &mut tracker);
        (tracker, report)
    }
}

fn apply_finding(tracker: &mut ValidationStateTracker, finding: &SnapshotFinding) {
    let entry = |message: &str, expected: &Option<String>, value: &str| {
        let entry = CellValidationEntry::new(message).value(value);
        match expected {
            Some(format) => entry.expected(format.clone()),
            None => entry,
        }
    };
    match finding {
        SnapshotFinding::CellError {
            row_id,
            field,
            message,
            expected_format,
            value,
        } => tracker.set_cell_error(row_id.clone(), *field, entry(message, expected_format, value)),
        SnapshotFinding::CellWarning {
            row_id,
            field,
            message,
            expected_format,
            value,
        } => tracker.set_cell_warning(row_id.clone(), *field, entry(message, expected_format, value)),
        SnapshotFinding::StructureError {
            row_id,
            message,
            rule,
        } => tracker.set_structure_error(
            row_id.clone(),
            StructureErrorEntry::new(message.clone(), rule.clone()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    const SNAPSHOT: &str = r#"{
        "context": { "tax_rate": 0.13, "customer_name": "Acme" },
        "rows": [
            { "row_id": "a", "product_type_id": 3, "fields": { "field1": "$1,200", "field2": { "option": "Red" } } },
            { "row_id": "sub", "product_type_id": 21 }
        ],
        "calculations": {
            "a": { "status": "completed", "quantity": 1, "components": [ { "name": "Sign", "price": 1200 } ] }
        },
        "validation": [
            { "kind": "cell_warning", "row_id": "a", "field": "field1", "message": "Large amount" }
        ]
    }"#;

    #[test]
    fn parses_rows_and_cells() {
        let snapshot = SheetSnapshot::from_json_str(SNAPSHOT).expect("snapshot");
        let rows = snapshot.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].field(FieldName::Field1).map(|c| &c.value),
            Some(&FieldValue::Number(1200.0))
        );
        assert_eq!(
            rows[0].field(FieldName::Field2).map(|c| &c.value),
            Some(&FieldValue::Option("Red".to_string()))
        );
        assert_eq!(snapshot.context.customer_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn tracker_applies_findings() {
        let snapshot = SheetSnapshot::from_json_str(SNAPSHOT).expect("snapshot");
        let rows = snapshot.rows();
        let (tracker, report) = snapshot.tracker(&rows);
        assert_eq!(tracker.warning_count(), 1);
        assert!(!tracker.has_blocking_errors());
        assert_eq!(report, FieldRuleReport::default());
    }

    #[test]
    fn duplicate_rows_block() {
        let snapshot = SheetSnapshot::from_json_str(
            r#"{ "rows": [ { "row_id": "a", "product_type_id": 3 }, { "row_id": "a", "product_type_id": 3 } ] }"#,
        )
        .expect("snapshot");
        let rows = snapshot.rows();
        let (tracker, _) = snapshot.tracker(&rows);
        assert!(tracker.has_blocking_errors());
        assert_eq!(
            tracker.structure_error(&RowId::from("a")).map(|e| e.rule.as_str()),
            Some(RULE_UNIQUE_ROW_ID)
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = SheetSnapshot::from_json_str("{ rows: ").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ParseError);
    }
}
