use clap::Parser;
use estimate_pipeline::{
    CliArgs, LoggingConfig, PipelineConfig, init_logging, preview_schema, run_preview,
};

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = PipelineConfig::from_args(cli)?;

    if config.print_schema {
        println!("{}", preview_schema()?);
        return Ok(());
    }

    let (output, pass) = run_preview(&config)?;
    println!("{output}");

    if config.fail_on_blocking && pass.blocked {
        anyhow::bail!(
            "{} blocking validation error(s); post-processing was skipped",
            pass.blocking_error_count
        );
    }
    Ok(())
}
