//! Structured logging for the preview binary and the spans every pricing
//! pass runs under.
//!
//! Output goes to stderr by default so stdout stays free for the rendered
//! preview. `LOG_OUTPUT=file` switches to a daily rolling file.

use anyhow::{Context, Result};
use std::env;
use std::io;
use std::path::PathBuf;
use strum::EnumString;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const SERVICE: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Only read when `output` is [`LogOutput::File`].
    pub log_dir: PathBuf,
    pub log_file_prefix: String,
    /// "production"/"prod" switches the defaults to JSON at info level.
    pub environment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogOutput {
    Stdout,
    Stderr,
    File,
}

fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let format = if is_production(&environment) {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };

        Self {
            format,
            output: LogOutput::Stderr,
            log_dir: PathBuf::from("logs"),
            log_file_prefix: "estimate-preview".to_string(),
            environment,
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `LOG_FORMAT`, `LOG_OUTPUT` and `LOG_DIR`.
    /// Unrecognised values keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(format) = parse_env("LOG_FORMAT") {
            config.format = format;
        }
        if let Some(output) = parse_env("LOG_OUTPUT") {
            config.output = output;
        }
        if let Ok(log_dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }
        config
    }

    fn default_filter(&self) -> EnvFilter {
        let level = if is_production(&self.environment) {
            "info"
        } else {
            "debug"
        };
        EnvFilter::new(format!("warn,estimate_pipeline={level}"))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

/// Installs the global subscriber. `RUST_LOG` wins over the defaults.
///
/// The returned guard flushes the non-blocking writer when dropped; hold it
/// until the process exits.
pub fn init_logging(config: LoggingConfig) -> Result<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_filter());

    let (writer, guard) = match config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogOutput::File => {
            std::fs::create_dir_all(&config.log_dir).with_context(|| {
                format!("Failed to create log directory {}", config.log_dir.display())
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::daily(
                &config.log_dir,
                &config.log_file_prefix,
            ))
        }
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(config.output != LogOutput::File)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        service = SERVICE,
        version = VERSION,
        environment = %config.environment,
        format = ?config.format,
        output = ?config.output,
        "logging initialized"
    );
    Ok(guard)
}

/// Span wrapping one pricing pass. `blocked` and `items` are recorded once
/// the pass knows them.
pub fn pass_span(estimate_id: Option<i64>, rows: usize) -> tracing::Span {
    tracing::info_span!(
        "pricing_pass",
        service = SERVICE,
        version = VERSION,
        estimate.id = ?estimate_id,
        rows,
        blocked = tracing::field::Empty,
        items = tracing::field::Empty,
    )
}

pub fn snapshot_span(path: &str) -> tracing::Span {
    tracing::info_span!("load_snapshot", snapshot.path = path)
}
