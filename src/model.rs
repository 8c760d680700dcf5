use crate::domain::{FieldCell, FieldName, ProductKind, ProductTypeId, RowId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the estimate grid, as handed over by the grid editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Row {
    pub row_id: RowId,
    pub product_type_id: ProductTypeId,
    #[serde(default)]
    pub product_type_name: String,
    #[serde(default)]
    pub display_number: String,
    #[serde(default)]
    pub fields: BTreeMap<FieldName, FieldCell>,
}

impl Row {
    pub fn new(row_id: impl Into<RowId>, product_type_id: ProductTypeId) -> Self {
        Self {
            row_id: row_id.into(),
            product_type_id,
            product_type_name: String::new(),
            display_number: String::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.product_type_name = name.into();
        self
    }

    pub fn with_display_number(mut self, display_number: impl Into<String>) -> Self {
        self.display_number = display_number.into();
        self
    }

    /// Sets a field from raw user input, parsing it the way the grid does.
    pub fn with_field(mut self, field: FieldName, raw: impl Into<String>) -> Self {
        self.fields.insert(field, FieldCell::from_raw(raw));
        self
    }

    pub fn field(&self, field: FieldName) -> Option<&FieldCell> {
        self.fields.get(&field)
    }

    pub fn kind(&self) -> ProductKind {
        self.product_type_id.kind()
    }
}

/// Positional metadata for one row of the directory.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct RowMetadata {
    pub position: usize,
    pub product_type_id: ProductTypeId,
    pub product_type_name: String,
    pub display_number: String,
}

impl RowMetadata {
    pub fn kind(&self) -> ProductKind {
        self.product_type_id.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    UlListing,
    Material,
    Labour,
    Other,
}

/// A priced sub-part of a row, produced by a calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Component {
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<ComponentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_display: Option<String>,
}

impl Component {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            component_type: None,
            calculation_display: None,
        }
    }

    pub fn ul_listing(name: impl Into<String>, price: f64) -> Self {
        Self {
            component_type: Some(ComponentType::UlListing),
            ..Self::new(name, price)
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.calculation_display = Some(display.into());
        self
    }

    pub fn is_ul(&self) -> bool {
        self.component_type == Some(ComponentType::UlListing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Completed,
    Pending,
    Error(String),
}

/// What a row calculator returns for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalculationResult {
    pub status: CalculationStatus,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub quantity: f64,
}

impl CalculationResult {
    pub fn completed(quantity: f64, components: Vec<Component>) -> Self {
        Self {
            status: CalculationStatus::Completed,
            components,
            quantity,
        }
    }

    pub fn pending() -> Self {
        Self {
            status: CalculationStatus::Pending,
            components: Vec::new(),
            quantity: 0.0,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CalculationStatus::Error(message.into()),
            components: Vec::new(),
            quantity: 0.0,
        }
    }
}

/// The unit the pipeline manipulates.
///
/// `extended_price` is stored rather than derived: multipliers rewrite the
/// quantity and synthetic items have no calculator origin at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EstimateLineItem {
    pub row_id: RowId,
    pub product_type_id: ProductTypeId,
    pub item_name: String,
    pub calculation_display: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub extended_price: f64,
}

impl EstimateLineItem {
    pub fn kind(&self) -> ProductKind {
        self.product_type_id.kind()
    }
}

/// Ambient values handed to every calculator and passed through to the
/// preview untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PricingContext {
    #[serde(default)]
    pub estimate_id: Option<i64>,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub cash_customer: bool,
    #[serde(default)]
    pub tax_rate: f64,
}

/// Final output of a pricing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EstimatePreviewData {
    pub items: Vec<EstimateLineItem>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub cash_customer: bool,
    pub estimate_id: Option<i64>,
}

impl EstimatePreviewData {
    /// Zero-valued preview carrying only the pass-through context.
    pub fn empty(context: &PricingContext) -> Self {
        Self {
            items: Vec::new(),
            subtotal: 0.0,
            tax_rate: context.tax_rate,
            tax_amount: 0.0,
            total: 0.0,
            customer_id: context.customer_id,
            customer_name: context.customer_name.clone(),
            cash_customer: context.cash_customer,
            estimate_id: context.estimate_id,
        }
    }
}
