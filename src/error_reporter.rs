use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::{FormError, SchemaError};

/// Error reporter with configurable verbosity
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
        }
    }

    pub fn with_timestamps(mut self, show_timestamps: bool) -> Self {
        self.show_timestamps = show_timestamps;
        self
    }

    /// Report a library error with appropriate verbosity
    pub fn report_error(&self, error: &FormError) {
        eprintln!("{}", self.format_error(error));
    }

    /// Report a configuration error
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    /// Format an error; quiet mode still gets a single line
    pub fn format_error(&self, error: &FormError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("ERROR: {}", error),
            VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
            VerbosityLevel::Debug => self.format_error_debug(error),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => {
                format!("Configuration Error: {}\n{}", error, config_help(error))
            }
            VerbosityLevel::Debug => format!(
                "Configuration Error: {}\nDebug: {:?}\n{}",
                error,
                error,
                config_help(error)
            ),
        }
    }

    fn format_error_normal(&self, error: &FormError) -> String {
        let timestamp = if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        };

        format!("{}{}", timestamp, error)
    }

    fn format_error_verbose(&self, error: &FormError) -> String {
        let mut output = self.format_error_normal(error);

        match error {
            FormError::Schema(SchemaError::InvalidPattern { field, .. }) => {
                output.push_str(&format!(
                    "\nSuggestion: Check the regular expression syntax of '{}'",
                    field
                ));
            }
            FormError::Schema(SchemaError::InapplicableOption { option, kind, .. }) => {
                output.push_str(&format!(
                    "\nSuggestion: Remove '{}' or change the field type; {} fields do not support it",
                    option, kind
                ));
            }
            FormError::Schema(_) => {
                output.push_str("\nSuggestion: Review the field configuration thresholds");
            }
            FormError::Toml(_) | FormError::Json(_) => {
                output.push_str("\nSuggestion: Check the file syntax (TOML/JSON format expected)");
            }
            FormError::NotAnObject { .. } => {
                output.push_str("\nSuggestion: A submission must be a JSON object of field values");
            }
            _ => {}
        }

        output
    }

    fn format_error_debug(&self, error: &FormError) -> String {
        let mut output = self.format_error_verbose(error);
        output.push_str(&format!("\nDebug Info: {:?}", error));

        output.push_str("\nError Chain:");
        let mut current_error: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current_error.source() {
            output.push_str(&format!("\n  {}: {}", level + 1, source));
            current_error = source;
            level += 1;
        }

        output
    }
}

fn config_help(error: &ConfigError) -> String {
    match error {
        ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
        ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
            "Check the configuration file syntax (TOML/JSON format expected)".to_string()
        }
        ConfigError::Validation(_) => "Fix the reported configuration value".to_string(),
        ConfigError::Environment(_) => {
            "Fix or unset the offending VALIDATE_FORM_* environment variable".to_string()
        }
        ConfigError::UnsupportedFormat(ext) => {
            format!("Rename the configuration file: '.{}' is not supported", ext)
        }
    }
}
