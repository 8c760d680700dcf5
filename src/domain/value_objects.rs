//! Domain value objects for estimate rows.
//!
//! NewType wrappers keep row identities, product-type tags and field names
//! from being mixed with plain strings and integers:
//!
//! ```rust,ignore
//! let row = RowId::new("r-42")?;
//! let kind = ProductTypeId::SUBTOTAL.kind();
//! // directory.position(&row) ✓ OK
//! // directory.position("r-42") ✗ Compile error!
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// Errors raised when constructing a value object from raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("{field} exceeds maximum length of {max} (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

// ============================================================================
// RowId - Stable identity of a grid row
// ============================================================================

/// Stable, order-independent identity of an estimate row.
///
/// Synthetic line items reuse the id of the special row that produced them.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    const MAX_LENGTH: usize = 128;

    /// Creates a new RowId with validation.
    ///
    /// # Errors
    /// Returns `Err` if the id is empty or exceeds maximum length.
    pub fn new(id: impl Into<String>) -> Result<Self, ValueObjectError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValueObjectError::Empty("RowId"));
        }
        if id.len() > Self::MAX_LENGTH {
            return Err(ValueObjectError::TooLong {
                field: "RowId",
                max: Self::MAX_LENGTH,
                actual: id.len(),
            });
        }
        Ok(Self(id))
    }

    /// Creates a RowId without validation. Ids coming from the grid editor
    /// are already unique and non-empty.
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::new_unchecked(value)
    }
}

// ============================================================================
// ProductTypeId - Behaviour tag of a row
// ============================================================================

/// Integer tag selecting the behaviour of a row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ProductTypeId(pub i64);

impl ProductTypeId {
    pub const ASSEMBLY: ProductTypeId = ProductTypeId(14);
    pub const SUBTOTAL: ProductTypeId = ProductTypeId(21);
    pub const DISCOUNT_FEE: ProductTypeId = ProductTypeId(22);
    pub const MULTIPLIER: ProductTypeId = ProductTypeId(23);
    pub const DIVIDER: ProductTypeId = ProductTypeId(25);
    pub const EMPTY_ROW: ProductTypeId = ProductTypeId(27);

    pub fn kind(self) -> ProductKind {
        match self {
            Self::EMPTY_ROW => ProductKind::EmptyRow,
            Self::ASSEMBLY => ProductKind::Assembly,
            Self::DIVIDER => ProductKind::Divider,
            Self::MULTIPLIER => ProductKind::Multiplier,
            Self::DISCOUNT_FEE => ProductKind::DiscountFee,
            Self::SUBTOTAL => ProductKind::Subtotal,
            _ => ProductKind::Regular,
        }
    }

    pub fn is_special(self) -> bool {
        self.kind() != ProductKind::Regular
    }
}

impl fmt::Display for ProductTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behaviour class derived from a [`ProductTypeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductKind {
    Regular,
    EmptyRow,
    Assembly,
    Divider,
    Multiplier,
    DiscountFee,
    Subtotal,
}

// ============================================================================
// FieldName - field1..field10
// ============================================================================

/// Name of one of the ten grid columns a row carries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldName {
    Field1,
    Field2,
    Field3,
    Field4,
    Field5,
    Field6,
    Field7,
    Field8,
    Field9,
    Field10,
}

// ============================================================================
// FieldValue / FieldCell - raw and parsed cell content
// ============================================================================

/// Parsed value of a grid cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Option(String),
}

impl FieldValue {
    /// Classifies raw user input. Currency symbols, thousands separators and a
    /// trailing percent sign are accepted around numbers.
    pub fn parse_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Empty;
        }
        let cleaned: String = trimmed
            .trim_end_matches('%')
            .chars()
            .filter(|c| *c != '$' && *c != ',')
            .collect();
        match cleaned.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => FieldValue::Number(number),
            _ => FieldValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }
}

/// One cell of a row: what the user typed plus the parsed value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FieldCell {
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub value: FieldValue,
}

impl FieldCell {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = FieldValue::parse_raw(&raw);
        Self { raw, value }
    }

    pub fn option(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            value: FieldValue::Option(raw.clone()),
            raw,
        }
    }

    /// Text content for memo-style fields. Numbers keep their raw spelling.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            FieldValue::Empty => None,
            FieldValue::Text(text) | FieldValue::Option(text) => Some(text.trim()),
            FieldValue::Number(_) => Some(self.raw.trim()),
        }
        .filter(|text| !text.is_empty())
    }
}
