use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use validate_form::{
    Cli, ConfigManager, ErrorReporter, FormConfig, FormError, Output, ValidationConfig,
    ValidationEngine, VerbosityLevel, compile_schema,
};

const EXIT_INVALID: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn init_tracing(cli: &Cli) {
    let default_level = if cli.debug {
        "validate_form=trace"
    } else if cli.verbose {
        "validate_form=debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    let startup_reporter = ErrorReporter::new(cli.verbosity());

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::from(EXIT_USAGE);
    }

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            startup_reporter.report_config_error(&e);
            return ExitCode::from(EXIT_USAGE);
        }
    };
    let verbosity = config.verbosity();
    let reporter =
        ErrorReporter::new(verbosity).with_timestamps(verbosity == VerbosityLevel::Debug);

    match run(&cli, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID),
        Err(e) => {
            match e.downcast_ref::<FormError>() {
                Some(form_error) => reporter.report_error(form_error),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::from(EXIT_USAGE)
        }
    }
}

/// Returns whether every submission was valid
async fn run(cli: &Cli, config: &validate_form::Config) -> anyhow::Result<bool> {
    let form_config = FormConfig::load(&cli.fields).await?;
    let schema = compile_schema(&form_config).map_err(FormError::from)?;

    let engine = ValidationEngine::new(
        schema,
        ValidationConfig {
            max_concurrent_validations: ConfigManager::get_thread_count(config),
            validation_timeout: ConfigManager::get_timeout_duration(config),
            fail_fast: config.validation.fail_fast,
        },
    );

    let results = engine
        .validate_paths(&cli.values)
        .await
        .context("failed to validate submissions")?;

    let output = Output::new(config.output.format.into(), config.verbosity());
    print!("{}", output.format_results(&results));

    Ok(results.all_valid())
}
