use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
    /// Show all available debugging information
    Debug,
}

/// Output format for validation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Human,
    /// Machine-readable JSON
    Json,
    /// Single summary line
    Summary,
}

/// Validate form submissions against a declarative field configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-form")]
#[command(about = "Validate form submissions (JSON objects) against a field configuration")]
#[command(version)]
pub struct Cli {
    /// Field configuration file (TOML or JSON)
    #[arg(help = "Field configuration file (TOML or JSON)")]
    pub fields: PathBuf,

    /// Submission files or directories of *.json submissions
    #[arg(required = true, help = "Submission files or directories to validate")]
    pub values: Vec<PathBuf>,

    /// Application configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Number of concurrent validations
    #[arg(
        short = 't',
        long = "threads",
        help = "Number of concurrent validations"
    )]
    pub threads: Option<usize>,

    /// Per-submission timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Stop at the first invalid submission
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Verbose output plus error codes, error chains and timestamps
    #[arg(long = "debug", help = "Enable debug output")]
    pub debug: bool,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with_all = ["verbose", "debug"]
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Verbosity requested on the command line alone
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.debug {
            VerbosityLevel::Debug
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.fields.exists() {
            return Err(format!(
                "Field configuration does not exist: {}",
                self.fields.display()
            ));
        }
        for path in &self.values {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        Ok(())
    }
}
