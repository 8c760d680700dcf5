//! Pricing pass benchmarks
//!
//! A pass is re-run on every grid edit, so its cost at a few hundred rows
//! is what matters.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use estimate_pipeline::domain::{FieldName, ProductTypeId, RowId};
use estimate_pipeline::model::{CalculationResult, Component, PricingContext, Row};
use estimate_pipeline::pricing::{CalculatorRegistry, EstimatePipeline, RecordedCalculator};
use estimate_pipeline::validation::ValidationStateTracker;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Sections of eight products closed by a divider, a discount and a
/// subtotal, with a multiplier every fourth section.
fn build_sheet(rows: usize) -> (Vec<Row>, CalculatorRegistry) {
    let mut sheet = Vec::with_capacity(rows);
    let mut recorded = BTreeMap::new();
    let mut index = 0;
    while sheet.len() < rows {
        let id = format!("r{index}");
        let row = match index % 12 {
            8 => Row::new(id.as_str(), ProductTypeId::DIVIDER),
            9 if index % 48 == 9 => {
                Row::new(id.as_str(), ProductTypeId::MULTIPLIER).with_field(FieldName::Field3, "2")
            }
            10 => Row::new(id.as_str(), ProductTypeId::DISCOUNT_FEE)
                .with_field(FieldName::Field2, "-5%")
                .with_field(FieldName::Field7, "25"),
            11 => Row::new(id.as_str(), ProductTypeId::SUBTOTAL),
            9 => Row::new(id.as_str(), ProductTypeId::EMPTY_ROW),
            _ => {
                recorded.insert(
                    RowId::from(id.as_str()),
                    CalculationResult::completed(
                        (index % 5 + 1) as f64,
                        vec![
                            Component::new("Sign face", 120.0 + index as f64),
                            Component::new("Install", 35.5),
                        ],
                    ),
                );
                Row::new(id.as_str(), ProductTypeId(3))
            }
        };
        sheet.push(row);
        index += 1;
    }
    let mut registry = CalculatorRegistry::new();
    registry.set_fallback(Arc::new(RecordedCalculator::new(recorded)));
    (sheet, registry)
}

fn bench_pricing_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing_pass");
    let context = PricingContext {
        tax_rate: 0.13,
        ..PricingContext::default()
    };
    let pipeline = EstimatePipeline::new();
    let mut tracker = ValidationStateTracker::new();
    tracker.update_blocking_status();

    for size in [24usize, 120, 480] {
        let (rows, registry) = build_sheet(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                black_box(pipeline.run(
                    black_box(rows),
                    Some(&tracker),
                    &registry,
                    &context,
                ))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pricing_pass);
criterion_main!(benches);
