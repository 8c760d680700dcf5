//! Row Metadata Directory: the single source of positional truth.
//!
//! Every scoping computation is a pure function of a row position and this
//! directory. Nothing holds references between rows.

use crate::domain::{ProductKind, RowId};
use crate::model::{Row, RowMetadata};
use indexmap::IndexMap;
use serde::Serialize;
use std::ops::Range;
use tracing::warn;

/// Where a window of preceding rows stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    /// Back to the nearest preceding Divider row, or the start of the sheet.
    Divider,
    /// Back to the nearest preceding Subtotal row, or the start of the sheet.
    /// Dividers do not stop it.
    Subtotal,
    /// The whole estimate above the row.
    Estimate,
}

impl Checkpoint {
    /// Row kind that closes this window, if any.
    fn boundary(self) -> Option<ProductKind> {
        match self {
            Checkpoint::Divider => Some(ProductKind::Divider),
            Checkpoint::Subtotal => Some(ProductKind::Subtotal),
            Checkpoint::Estimate => None,
        }
    }

    /// Prefix used in calculation breakdown lines.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Checkpoint::Divider => Some("Divider:"),
            Checkpoint::Subtotal => Some("Subtotal:"),
            Checkpoint::Estimate => None,
        }
    }
}

/// Half-open range of row positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window(Range<usize>);

impl Window {
    pub fn contains(&self, position: usize) -> bool {
        self.0.contains(&position)
    }

    pub fn start(&self) -> usize {
        self.0.start
    }

    pub fn end(&self) -> usize {
        self.0.end
    }
}

/// Insertion-ordered `(row_id, metadata)` listing of a sheet.
#[derive(Debug, Clone, Default)]
pub struct RowDirectory {
    entries: IndexMap<RowId, RowMetadata>,
}

impl RowDirectory {
    /// Builds the directory from grid order. A repeated row id keeps its
    /// first position.
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut entries = IndexMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            if entries.contains_key(&row.row_id) {
                warn!(row_id = %row.row_id, position, "duplicate row id ignored");
                continue;
            }
            entries.insert(
                row.row_id.clone(),
                RowMetadata {
                    position,
                    product_type_id: row.product_type_id,
                    product_type_name: row.product_type_name.clone(),
                    display_number: row.display_number.clone(),
                },
            );
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowId, &RowMetadata)> {
        self.entries.iter()
    }

    pub fn get(&self, row_id: &RowId) -> Option<&RowMetadata> {
        self.entries.get(row_id)
    }

    pub fn position(&self, row_id: &RowId) -> Option<usize> {
        self.entries.get(row_id).map(|meta| meta.position)
    }

    /// Rows of one kind, in sheet order.
    pub fn rows_of_kind(&self, kind: ProductKind) -> impl Iterator<Item = (&RowId, &RowMetadata)> {
        self.entries
            .iter()
            .filter(move |(_, meta)| meta.kind() == kind)
    }

    /// Positions of the rows above `position` that a checkpoint covers.
    pub fn window(&self, position: usize, checkpoint: Checkpoint) -> Window {
        let start = checkpoint
            .boundary()
            .and_then(|boundary| {
                self.entries
                    .values()
                    .rev()
                    .filter(|meta| meta.position < position)
                    .find(|meta| meta.kind() == boundary)
                    .map(|meta| meta.position + 1)
            })
            .unwrap_or(0);
        Window(start..position)
    }

    /// Whether `row_id` sits inside `window`. Unknown rows never do.
    pub fn in_window(&self, row_id: &RowId, window: &Window) -> bool {
        self.position(row_id)
            .is_some_and(|position| window.contains(position))
    }
}
