//! Contract with the per-product calculators.
//!
//! Calculators are black boxes keyed by product type. They receive the row,
//! the ambient pricing context and whether a UL listing was already charged
//! in the current section.

use crate::domain::{ProductTypeId, RowId};
use crate::model::{CalculationResult, PricingContext, Row};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub trait RowCalculator: Send + Sync {
    fn calculate(&self, row: &Row, context: &PricingContext, ul_in_section: bool)
    -> CalculationResult;
}

impl<F> RowCalculator for F
where
    F: Fn(&Row, &PricingContext, bool) -> CalculationResult + Send + Sync,
{
    fn calculate(
        &self,
        row: &Row,
        context: &PricingContext,
        ul_in_section: bool,
    ) -> CalculationResult {
        self(row, context, ul_in_section)
    }
}

/// Calculator that has to await something, e.g. a remote price table.
#[async_trait]
pub trait AsyncRowCalculator: Send + Sync {
    async fn calculate(
        &self,
        row: &Row,
        context: &PricingContext,
        ul_in_section: bool,
    ) -> CalculationResult;
}

#[async_trait]
impl<T> AsyncRowCalculator for T
where
    T: RowCalculator,
{
    async fn calculate(
        &self,
        row: &Row,
        context: &PricingContext,
        ul_in_section: bool,
    ) -> CalculationResult {
        RowCalculator::calculate(self, row, context, ul_in_section)
    }
}

/// Calculators keyed by product type, with an optional catch-all.
pub struct Registry<C: ?Sized> {
    calculators: HashMap<ProductTypeId, Arc<C>>,
    fallback: Option<Arc<C>>,
}

pub type CalculatorRegistry = Registry<dyn RowCalculator>;
pub type AsyncCalculatorRegistry = Registry<dyn AsyncRowCalculator>;

impl<C: ?Sized> Registry<C> {
    pub fn new() -> Self {
        Self {
            calculators: HashMap::new(),
            fallback: None,
        }
    }

    pub fn register(&mut self, product_type_id: ProductTypeId, calculator: Arc<C>) -> &mut Self {
        self.calculators.insert(product_type_id, calculator);
        self
    }

    /// Used for every product type without its own calculator.
    pub fn set_fallback(&mut self, calculator: Arc<C>) -> &mut Self {
        self.fallback = Some(calculator);
        self
    }

    pub fn get(&self, product_type_id: ProductTypeId) -> Option<&C> {
        self.calculators
            .get(&product_type_id)
            .or(self.fallback.as_ref())
            .map(|calculator| calculator.as_ref())
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty() && self.fallback.is_none()
    }
}

impl<C: ?Sized> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Replays calculator results recorded by the host application.
///
/// Rows without a recording report `Pending`.
#[derive(Debug, Clone, Default)]
pub struct RecordedCalculator {
    results: BTreeMap<RowId, CalculationResult>,
}

impl RecordedCalculator {
    pub fn new(results: BTreeMap<RowId, CalculationResult>) -> Self {
        Self { results }
    }

    pub fn record(&mut self, row_id: RowId, result: CalculationResult) {
        self.results.insert(row_id, result);
    }
}

impl RowCalculator for RecordedCalculator {
    fn calculate(
        &self,
        row: &Row,
        _context: &PricingContext,
        _ul_in_section: bool,
    ) -> CalculationResult {
        self.results
            .get(&row.row_id)
            .cloned()
            .unwrap_or_else(CalculationResult::pending)
    }
}
