mod support;

use clap::Parser;
use estimate_pipeline::{CliArgs, OutputFormat, PipelineConfig, run_preview};
use support::{TestWorkspace, fixture};

#[test]
fn merges_config_file_and_cli_overrides() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("sheet.json", r#"{ "rows": [] }"#);
    let config_path = workspace.write(
        "preview.yaml",
        "sheet: sheet.json\nformat: text\ntax_rate: 0.05\ndiagnostics: true\n",
    );

    let args = CliArgs::parse_from([
        "estimate-preview",
        "--config",
        config_path.to_str().unwrap(),
        "--tax-rate",
        "0.13",
    ]);
    let config = PipelineConfig::from_args(args).expect("config");

    assert_eq!(config.sheet.as_deref(), Some(sheet.as_path()));
    assert_eq!(config.format, OutputFormat::Text);
    assert_eq!(config.tax_rate, Some(0.13));
    assert!(config.include_diagnostics);
    assert!(!config.fail_on_blocking);
}

#[test]
fn json_config_is_supported() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("sheet.json", r#"{ "rows": [] }"#);
    let config_path = workspace.write(
        "preview.json",
        &format!(
            r#"{{ "sheet": {:?}, "format": "json", "fail_on_blocking": true }}"#,
            sheet.to_str().unwrap()
        ),
    );

    let args = CliArgs::parse_from(["estimate-preview", "--config", config_path.to_str().unwrap()]);
    let config = PipelineConfig::from_args(args).expect("config");

    assert_eq!(config.sheet.as_deref(), Some(sheet.as_path()));
    assert_eq!(config.format, OutputFormat::Json);
    assert!(config.fail_on_blocking);
    assert_eq!(config.tax_rate, None);
}

#[test]
fn rejects_out_of_range_tax_rate() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("sheet.json", r#"{ "rows": [] }"#);
    let args = CliArgs::parse_from([
        "estimate-preview",
        "--sheet",
        sheet.to_str().unwrap(),
        "--tax-rate",
        "13",
    ]);
    let err = PipelineConfig::from_args(args).unwrap_err();
    assert!(format!("{err:#}").contains("tax_rate"));
}

#[test]
fn requires_an_existing_sheet() {
    let args = CliArgs::parse_from(["estimate-preview"]);
    assert!(PipelineConfig::from_args(args).is_err());

    let workspace = TestWorkspace::new();
    let missing = workspace.path("missing.json");
    let args = CliArgs::parse_from(["estimate-preview", "--sheet", missing.to_str().unwrap()]);
    let err = PipelineConfig::from_args(args).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn print_schema_needs_no_sheet() {
    let args = CliArgs::parse_from(["estimate-preview", "--print-schema"]);
    let config = PipelineConfig::from_args(args).expect("config");
    assert!(config.print_schema);

    let schema = estimate_pipeline::preview_schema().expect("schema");
    assert!(schema.contains("tax_amount"));
    assert!(schema.contains("extended_price"));
}

#[test]
fn rejects_unknown_config_keys_and_extensions() {
    let workspace = TestWorkspace::new();
    let bad_key = workspace.write("preview.yaml", "sheet: a.json\nworkspace_root: .\n");
    let args = CliArgs::parse_from(["estimate-preview", "--config", bad_key.to_str().unwrap()]);
    assert!(PipelineConfig::from_args(args).is_err());

    let bad_ext = workspace.write("preview.toml", "sheet = \"a.json\"\n");
    let args = CliArgs::parse_from(["estimate-preview", "--config", bad_ext.to_str().unwrap()]);
    let err = PipelineConfig::from_args(args).unwrap_err();
    assert!(err.to_string().contains("unsupported config extension"));
}

#[test]
fn sample_fixture_renders_as_json() {
    let args = CliArgs::parse_from([
        "estimate-preview",
        "--sheet",
        fixture("sheets/sample_estimate.json").to_str().unwrap(),
    ]);
    let config = PipelineConfig::from_args(args).expect("config");
    let (output, pass) = run_preview(&config).expect("preview");

    assert!(!pass.blocked);
    assert!(pass.diagnostics.is_clean());
    assert_eq!(pass.preview.subtotal, 7538.35);
    assert_eq!(pass.preview.tax_amount, 979.99);
    assert_eq!(pass.preview.total, 8518.34);
    assert_eq!(pass.preview.customer_name.as_deref(), Some("Harbor Dental"));

    let value: serde_json::Value = serde_json::from_str(&output).expect("json output");
    assert_eq!(value["estimate_id"], 2048);
    assert_eq!(value["items"].as_array().map(Vec::len), Some(10));
}

#[test]
fn sample_fixture_renders_as_text_through_config_file() {
    let args = CliArgs::parse_from([
        "estimate-preview",
        "--config",
        fixture("config/preview.yaml").to_str().unwrap(),
        "--tax-rate",
        "0",
    ]);
    let config = PipelineConfig::from_args(args).expect("config");
    let (output, pass) = run_preview(&config).expect("preview");

    assert_eq!(pass.preview.tax_amount, 0.0);
    assert!(output.contains("Install-day surcharge"));
    assert!(output.contains("Divider: 15% of $121.00 = $18.15"));
    assert!(output.contains("-5% of $7,916.00 = -$395.80"));
    assert!(output.contains("Total:"));
}

const NEGATIVE_TAX_SNAPSHOT: &str = r#"{
  "context": { "estimate_id": 9, "tax_rate": -0.05 },
  "rows": [{ "row_id": "a", "product_type_id": 3 }],
  "calculations": {
    "a": { "status": "completed", "quantity": 1.0, "components": [{ "name": "Sign", "price": 40.0 }] }
  }
}"#;

#[test]
fn snapshot_tax_rate_is_guarded() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("negative_tax.json", NEGATIVE_TAX_SNAPSHOT);
    let args = CliArgs::parse_from(["estimate-preview", "--sheet", sheet.to_str().unwrap()]);
    let config = PipelineConfig::from_args(args).expect("config");

    let err = run_preview(&config).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("invalid tax_rate in snapshot"));
    assert!(message.contains("tax_rate"));
}

#[test]
fn tax_rate_override_replaces_a_bad_snapshot_rate() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("negative_tax.json", NEGATIVE_TAX_SNAPSHOT);
    let args = CliArgs::parse_from([
        "estimate-preview",
        "--sheet",
        sheet.to_str().unwrap(),
        "--tax-rate",
        "0.1",
    ]);
    let config = PipelineConfig::from_args(args).expect("config");

    let (_, pass) = run_preview(&config).expect("preview");
    assert_eq!(pass.preview.subtotal, 40.0);
    assert_eq!(pass.preview.tax_amount, 4.0);
    assert_eq!(pass.preview.total, 44.0);
}
