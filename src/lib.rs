pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod model;
pub mod pricing;
pub mod recovery;
pub mod render;
pub mod snapshot;
pub mod validation;

pub use config::{CliArgs, OutputFormat, PipelineConfig};
pub use error::{ErrorCode, PipelineError, PipelineResult};
pub use logging::{LoggingConfig, init_logging};
pub use model::{EstimateLineItem, EstimatePreviewData, PricingContext, Row};
pub use pricing::{EstimatePipeline, PricingPass};
pub use snapshot::SheetSnapshot;

use anyhow::{Context, Result};
use error::ResultExt;
use serde::Serialize;
use validation::validate_tax_rate;

#[derive(Serialize)]
struct PreviewWithDiagnostics<'a> {
    preview: &'a EstimatePreviewData,
    diagnostics: &'a recovery::PassDiagnostics,
    blocked: bool,
    blocking_error_count: usize,
}

/// Loads the configured snapshot, prices it and renders the result.
///
/// Returns the rendered output together with the pass so the caller can
/// decide on the exit status.
pub fn run_preview(config: &PipelineConfig) -> Result<(String, PricingPass)> {
    let Some(path) = config.sheet.as_deref() else {
        anyhow::bail!("no sheet snapshot configured");
    };
    let snapshot = SheetSnapshot::load(path).with_operation("load_snapshot")?;

    let mut context = snapshot.context.clone();
    context.tax_rate = match config.tax_rate {
        Some(tax_rate) => tax_rate,
        None => validate_tax_rate(context.tax_rate)
            .with_context(|| format!("invalid tax_rate in snapshot {}", path.display()))?,
    };
    let rows = snapshot.rows();
    let (tracker, _) = snapshot.tracker(&rows);
    let registry = snapshot.registry();

    let pass = EstimatePipeline::new().run(&rows, Some(&tracker), &registry, &context);

    let output = match config.format {
        OutputFormat::Json if config.include_diagnostics => serde_json::to_string_pretty(
            &PreviewWithDiagnostics {
                preview: &pass.preview,
                diagnostics: &pass.diagnostics,
                blocked: pass.blocked,
                blocking_error_count: pass.blocking_error_count,
            },
        )
        .with_estimate(context.estimate_id)?,
        OutputFormat::Json => {
            serde_json::to_string_pretty(&pass.preview).with_estimate(context.estimate_id)?
        }
        OutputFormat::Text => {
            let mut text = render::render_text(&pass.preview, &rows);
            if config.include_diagnostics {
                for failure in &pass.diagnostics.row_failures {
                    text.push_str(&format!("! row {}: {}\n", failure.row_id, failure.message));
                }
                for fallback in &pass.diagnostics.stage_fallbacks {
                    text.push_str(&format!("! stage {}: {}\n", fallback.stage, fallback.message));
                }
                for warning in &pass.diagnostics.warnings {
                    text.push_str(&format!("! {warning}\n"));
                }
            }
            text
        }
    };
    Ok((output, pass))
}

/// JSON Schema of [`EstimatePreviewData`].
pub fn preview_schema() -> Result<String> {
    let schema = schemars::schema_for!(EstimatePreviewData);
    serde_json::to_string_pretty(&schema).with_operation("print_schema")
}
