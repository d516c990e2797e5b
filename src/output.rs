//! Output and Reporting
//!
//! Formats batch validation results as human-readable text, JSON, or a
//! one-line summary.

use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::validator::{SubmissionResult, SubmissionStatus, ValidationResults};

pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_results(&self, results: &ValidationResults) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(results),
            OutputFormat::Json => format_json(results),
            OutputFormat::Summary => format_summary_line(results),
        }
    }

    fn format_human(&self, results: &ValidationResults) -> String {
        let mut output = String::new();

        if self.verbosity == VerbosityLevel::Quiet {
            if results.has_errors() {
                output.push_str(&format!(
                    "Invalid: {} Errors: {}\n",
                    results.invalid, results.errors
                ));
            }
            return output;
        }

        for result in &results.results {
            if self.verbosity >= VerbosityLevel::Verbose || !result.status.is_valid() {
                output.push_str(&self.format_submission(result));
                output.push('\n');
            }
        }

        output.push_str(&self.format_summary(results));
        output
    }

    pub fn format_submission(&self, result: &SubmissionResult) -> String {
        let path_display = result.path.display();
        let duration_str = format_duration(result.duration);

        match &result.status {
            SubmissionStatus::Valid => format!(
                "{}  {} ({})",
                self.colorize("✓ VALID", "32"),
                path_display,
                duration_str
            ),
            SubmissionStatus::Invalid { errors } => {
                let mut output = format!(
                    "{}  {} ({}) - {} field error{}",
                    self.colorize("✗ INVALID", "31"),
                    path_display,
                    duration_str,
                    errors.len(),
                    if errors.len() == 1 { "" } else { "s" }
                );
                for (field, error) in errors {
                    output.push_str(&format!("\n    {}: {}", field, error.message));
                    if self.verbosity >= VerbosityLevel::Debug {
                        output.push_str(&format!(" [{}]", error.code));
                    }
                }
                output
            }
            SubmissionStatus::Error { message } => format!(
                "{}  {} ({}) - {}",
                self.colorize("⚠ ERROR", "33"),
                path_display,
                duration_str,
                message
            ),
        }
    }

    fn format_summary(&self, results: &ValidationResults) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total submissions: {}\n", results.total));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            results.valid
        ));
        if results.invalid > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                results.invalid
            ));
        }
        if results.errors > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                results.errors
            ));
        }
        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.total_duration)
        ));
        output
    }
}

fn format_json(results: &ValidationResults) -> String {
    // Serializing plain data cannot fail
    serde_json::to_string_pretty(results).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

fn format_summary_line(results: &ValidationResults) -> String {
    format!(
        "{} submissions: {} valid, {} invalid, {} errors\n",
        results.total, results.valid, results.invalid, results.errors
    )
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
