#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use estimate_pipeline::domain::{FieldName, ProductTypeId, RowId};
use estimate_pipeline::model::{CalculationResult, Component, PricingContext, Row};
use estimate_pipeline::pricing::{CalculatorRegistry, EstimatePipeline, PricingPass, RecordedCalculator};
use estimate_pipeline::validation::ValidationStateTracker;
use tempfile::{TempDir, tempdir};

/// Regular product priced from recorded results.
pub const SIGN: ProductTypeId = ProductTypeId(3);
/// Regular product that charges a UL listing once per section.
pub const UL_SIGN: ProductTypeId = ProductTypeId(4);
pub const UL_FEE: f64 = 45.0;

/// Builds a sheet row by row together with the calculator results for it.
#[derive(Debug, Default, Clone)]
pub struct SheetBuilder {
    rows: Vec<Row>,
    recorded: BTreeMap<RowId, CalculationResult>,
}

impl SheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Product with one component and quantity 1.
    pub fn product(self, id: &str, price: f64) -> Self {
        self.product_with(id, 1.0, vec![Component::new(format!("Item {id}"), price)])
    }

    pub fn product_with(mut self, id: &str, quantity: f64, components: Vec<Component>) -> Self {
        self.recorded.insert(
            RowId::from(id),
            CalculationResult::completed(quantity, components),
        );
        let display_number = (self.rows.len() + 1).to_string();
        self.row(Row::new(id, SIGN).with_display_number(display_number))
    }

    pub fn ul_product(self, id: &str, price: f64) -> Self {
        self.row(Row::new(id, UL_SIGN).with_field(FieldName::Field1, price.to_string()))
    }

    pub fn divider(self, id: &str) -> Self {
        self.row(Row::new(id, ProductTypeId::DIVIDER))
    }

    pub fn empty_row(self, id: &str) -> Self {
        self.row(Row::new(id, ProductTypeId::EMPTY_ROW))
    }

    pub fn subtotal(self, id: &str) -> Self {
        self.row(Row::new(id, ProductTypeId::SUBTOTAL))
    }

    pub fn discount_fee(self, id: &str, fields: &[(FieldName, &str)]) -> Self {
        self.special(id, ProductTypeId::DISCOUNT_FEE, fields)
    }

    pub fn multiplier(self, id: &str, fields: &[(FieldName, &str)]) -> Self {
        self.special(id, ProductTypeId::MULTIPLIER, fields)
    }

    pub fn special(self, id: &str, product_type_id: ProductTypeId, fields: &[(FieldName, &str)]) -> Self {
        let row = fields
            .iter()
            .fold(Row::new(id, product_type_id), |row, (field, raw)| {
                row.with_field(*field, *raw)
            });
        self.row(row)
    }

    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn registry(&self) -> CalculatorRegistry {
        let mut registry = CalculatorRegistry::new();
        registry
            .register(UL_SIGN, Arc::new(ul_calculator))
            .set_fallback(Arc::new(RecordedCalculator::new(self.recorded.clone())));
        registry
    }

    /// Runs a full pass with a clean tracker.
    pub fn run(&self, tax_rate: f64) -> PricingPass {
        let mut tracker = ValidationStateTracker::new();
        tracker.update_blocking_status();
        self.run_with(&tracker, tax_rate)
    }

    pub fn run_with(&self, tracker: &ValidationStateTracker, tax_rate: f64) -> PricingPass {
        EstimatePipeline::new().run(&self.rows, Some(tracker), &self.registry(), &context(tax_rate))
    }
}

/// Sign priced from field1; adds the UL listing unless the section already has one.
pub fn ul_calculator(row: &Row, _context: &PricingContext, ul_in_section: bool) -> CalculationResult {
    let price = row
        .field(FieldName::Field1)
        .and_then(|cell| cell.raw.parse::<f64>().ok())
        .unwrap_or(0.0);
    let mut components = vec![Component::new("Sign", price)];
    if !ul_in_section {
        components.push(Component::ul_listing("UL Listing", UL_FEE));
    }
    CalculationResult::completed(1.0, components)
}

pub fn context(tax_rate: f64) -> PricingContext {
    PricingContext {
        estimate_id: Some(1001),
        customer_id: Some(77),
        customer_name: Some("Northwind Signs".to_string()),
        cash_customer: false,
        tax_rate,
    }
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("write file");
        path
    }
}

/// Path of a fixture shipped with the crate.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}
