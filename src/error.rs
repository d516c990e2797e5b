use std::path::PathBuf;

use thiserror::Error;

/// Main library error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum FormError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Unknown field: {name}")]
    UnknownField { name: String },

    #[error("Unsupported field configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Submission is not a JSON object: {file}")]
    NotAnObject { file: PathBuf },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

/// Errors raised while compiling a field configuration into a schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid pattern for field '{field}': {details}")]
    InvalidPattern { field: String, details: String },

    #[error("Invalid thresholds for field '{field}': {lower} > {upper}")]
    InvertedThresholds {
        field: String,
        lower: String,
        upper: String,
    },

    #[error("Non-finite threshold for field '{field}': {option}")]
    NonFiniteThreshold { field: String, option: String },

    #[error("Option '{option}' does not apply to {kind} field '{field}'")]
    InapplicableOption {
        field: String,
        kind: String,
        option: String,
    },

    #[error("Field '{field}' must match unknown field '{target}'")]
    UnknownMatchTarget { field: String, target: String },

    #[error("Field '{field}' cannot match itself")]
    SelfMatch { field: String },
}

/// Failure reported by a submit handler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SubmitError {
    pub message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FormError>;

/// Schema compilation result type alias
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
