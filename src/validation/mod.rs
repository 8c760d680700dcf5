//! Validation state and input guards.
//!
//! - [`tracker`]: per-cell Error/Warning/Valid state and the sheet-wide
//!   blocking flag consulted before post-processing
//! - [`field_rules`]: validation producer for special control rows
//! - [`input_guards`]: guards for configuration and snapshot values
//!
//! # Usage
//!
//! ```rust
//! use estimate_pipeline::domain::{FieldName, RowId};
//! use estimate_pipeline::validation::{CellValidationEntry, ValidationStateTracker};
//!
//! let mut tracker = ValidationStateTracker::new();
//! {
//!     let mut batch = tracker.batch();
//!     batch.set_cell_error(
//!         RowId::from("r-1"),
//!         FieldName::Field2,
//!         CellValidationEntry::new("Width must be a number").expected("number"),
//!     );
//! }
//! assert!(tracker.has_blocking_errors());
//! ```

pub mod field_rules;
pub mod input_guards;
pub mod tracker;

pub use field_rules::{FieldRuleReport, validate_special_rows};
pub use input_guards::{
    ValidationError, ValidationResult, validate_non_empty_string, validate_numeric_range,
    validate_tax_rate, validate_unique_row_ids,
};
pub use tracker::{
    CellState, CellValidationEntry, StructureErrorEntry, ValidationBatch, ValidationStateTracker,
};
