use crate::validation::validate_tax_rate;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    #[value(alias = "table")]
    #[serde(alias = "table")]
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Sheet snapshot to price. Only optional when printing the schema.
    pub sheet: Option<PathBuf>,
    pub format: OutputFormat,
    /// Replaces the tax rate carried by the snapshot.
    pub tax_rate: Option<f64>,
    pub fail_on_blocking: bool,
    pub include_diagnostics: bool,
    pub print_schema: bool,
}

impl PipelineConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            sheet: cli_sheet,
            format: cli_format,
            tax_rate: cli_tax_rate,
            fail_on_blocking: cli_fail_on_blocking,
            diagnostics: cli_diagnostics,
            print_schema,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            sheet: file_sheet,
            format: file_format,
            tax_rate: file_tax_rate,
            fail_on_blocking: file_fail_on_blocking,
            diagnostics: file_diagnostics,
        } = file_config;

        let sheet = cli_sheet.or_else(|| {
            file_sheet.map(|path| {
                match config.as_deref().and_then(Path::parent) {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path,
                }
            })
        });

        let tax_rate = cli_tax_rate
            .or(file_tax_rate)
            .map(|rate| validate_tax_rate(rate).context("invalid tax rate"))
            .transpose()?;

        let config = Self {
            sheet,
            format: cli_format.or(file_format).unwrap_or_default(),
            tax_rate,
            fail_on_blocking: cli_fail_on_blocking || file_fail_on_blocking.unwrap_or(false),
            include_diagnostics: cli_diagnostics || file_diagnostics.unwrap_or(false),
            print_schema,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.print_schema {
            return Ok(());
        }
        let Some(sheet) = self.sheet.as_ref() else {
            anyhow::bail!("no sheet snapshot given (use --sheet or set `sheet` in the config file)");
        };
        anyhow::ensure!(sheet.exists(), "sheet snapshot {:?} does not exist", sheet);
        anyhow::ensure!(sheet.is_file(), "sheet snapshot {:?} is not a file", sheet);
        Ok(())
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "estimate-preview",
    about = "Price an estimate sheet snapshot and print the preview",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "ESTIMATE_PREVIEW_SHEET",
        value_name = "FILE",
        help = "Sheet snapshot (JSON) to price"
    )]
    pub sheet: Option<PathBuf>,

    #[arg(
        long,
        env = "ESTIMATE_PREVIEW_FORMAT",
        value_enum,
        value_name = "FORMAT",
        help = "Output format (json or text)"
    )]
    pub format: Option<OutputFormat>,

    #[arg(
        long,
        env = "ESTIMATE_PREVIEW_TAX_RATE",
        value_name = "RATE",
        help = "Tax rate as a fraction, overriding the snapshot (0.13 = 13%)",
        value_parser = clap::value_parser!(f64)
    )]
    pub tax_rate: Option<f64>,

    #[arg(
        long,
        env = "ESTIMATE_PREVIEW_FAIL_ON_BLOCKING",
        help = "Exit with an error when validation blocked post-processing"
    )]
    pub fail_on_blocking: bool,

    #[arg(
        long,
        env = "ESTIMATE_PREVIEW_DIAGNOSTICS",
        help = "Include pass diagnostics in the output"
    )]
    pub diagnostics: bool,

    #[arg(long, help = "Print the JSON Schema of the preview and exit")]
    pub print_schema: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    sheet: Option<PathBuf>,
    format: Option<OutputFormat>,
    tax_rate: Option<f64>,
    fail_on_blocking: Option<bool>,
    diagnostics: Option<bool>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
