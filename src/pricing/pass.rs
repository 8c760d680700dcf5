//! One full pricing pass: invocation, gated post-processing, aggregation.

use super::aggregate::aggregate;
use super::calculator::{AsyncCalculatorRegistry, CalculatorRegistry};
use super::directory::RowDirectory;
use super::invocation::{price_rows, price_rows_async};
use super::stages::{PostProcessingChain, StageContext};
use crate::logging::pass_span;
use crate::model::{EstimateLineItem, EstimatePreviewData, PricingContext, Row};
use crate::recovery::PassDiagnostics;
use crate::validation::ValidationStateTracker;
use serde::Serialize;
use tracing::{Instrument, debug, info, warn};

/// Everything a pass produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingPass {
    pub preview: EstimatePreviewData,
    pub diagnostics: PassDiagnostics,
    /// Post-processing was skipped because of blocking validation errors.
    pub blocked: bool,
    /// Cell errors plus structure errors at the time of the pass.
    pub blocking_error_count: usize,
}

impl PricingPass {
    fn zero(context: &PricingContext) -> Self {
        Self {
            preview: EstimatePreviewData::empty(context),
            diagnostics: PassDiagnostics::new(),
            blocked: false,
            blocking_error_count: 0,
        }
    }
}

/// Runs pricing passes with a fixed post-processing chain.
#[derive(Debug, Default)]
pub struct EstimatePipeline {
    chain: PostProcessingChain,
}

impl EstimatePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(chain: PostProcessingChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &PostProcessingChain {
        &self.chain
    }

    /// Prices `rows`. Without a tracker, or without rows, the result is a
    /// zero-valued preview.
    pub fn run(
        &self,
        rows: &[Row],
        tracker: Option<&ValidationStateTracker>,
        registry: &CalculatorRegistry,
        context: &PricingContext,
    ) -> PricingPass {
        let span = pass_span(context.estimate_id, rows.len());
        let _entered = span.enter();

        let directory = RowDirectory::from_rows(rows);
        let Some(tracker) = self.ready(&directory, tracker) else {
            return PricingPass::zero(context);
        };
        let mut diagnostics = PassDiagnostics::new();
        let raw = price_rows(rows, &directory, registry, context, &mut diagnostics);
        self.finish(raw, rows, &directory, tracker, context, diagnostics)
    }

    /// Like [`run`](Self::run) with calculators that are awaited one row at
    /// a time.
    pub async fn run_async(
        &self,
        rows: &[Row],
        tracker: Option<&ValidationStateTracker>,
        registry: &AsyncCalculatorRegistry,
        context: &PricingContext,
    ) -> PricingPass {
        let span = pass_span(context.estimate_id, rows.len());
        async {
            let directory = RowDirectory::from_rows(rows);
            let Some(tracker) = self.ready(&directory, tracker) else {
                return PricingPass::zero(context);
            };
            let mut diagnostics = PassDiagnostics::new();
            let raw = price_rows_async(rows, &directory, registry, context, &mut diagnostics).await;
            self.finish(raw, rows, &directory, tracker, context, diagnostics)
        }
        .instrument(span)
        .await
    }

    fn ready<'t>(
        &self,
        directory: &RowDirectory,
        tracker: Option<&'t ValidationStateTracker>,
    ) -> Option<&'t ValidationStateTracker> {
        match tracker {
            None => {
                warn!("no validation tracker attached, returning empty preview");
                None
            }
            Some(_) if directory.is_empty() => {
                debug!("empty sheet");
                None
            }
            Some(tracker) => Some(tracker),
        }
    }

    fn finish(
        &self,
        raw: Vec<EstimateLineItem>,
        rows: &[Row],
        directory: &RowDirectory,
        tracker: &ValidationStateTracker,
        context: &PricingContext,
        mut diagnostics: PassDiagnostics,
    ) -> PricingPass {
        let blocked = tracker.has_blocking_errors();
        let blocking_error_count = tracker.error_count() + tracker.structure_error_count();

        let items = if blocked {
            info!(
                blocking_errors = blocking_error_count,
                "validation errors present, skipping post-processing"
            );
            diagnostics.add_warning(format!(
                "post-processing skipped: {blocking_error_count} blocking validation error(s)"
            ));
            raw
        } else {
            let stage_context = StageContext::new(directory, rows, context.tax_rate);
            self.chain.run(raw, &stage_context, &mut diagnostics)
        };

        let span = tracing::Span::current();
        span.record("blocked", blocked);
        span.record("items", items.len());

        let preview = aggregate(items, context);
        info!(
            subtotal = preview.subtotal,
            tax = preview.tax_amount,
            total = preview.total,
            failures = diagnostics.failure_count(),
            "pricing pass finished"
        );
        PricingPass {
            preview,
            diagnostics,
            blocked,
            blocking_error_count,
        }
    }
}
