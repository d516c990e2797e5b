//! # validate-form Library
//!
//! Compiles a declarative form description (field name to field configuration)
//! into a validation schema, and binds that schema to a headless form: values,
//! per-field errors, touched/dirty tracking and submission handling.
//!
//! ```
//! use serde_json::json;
//! use validate_form::{FieldConfig, FormConfig, compile_schema};
//!
//! let config = FormConfig::new()
//!     .field("email", FieldConfig::email().with_label("Email").required())
//!     .field("age", FieldConfig::number().with_min(18.0));
//! let schema = compile_schema(&config).unwrap();
//!
//! let values = json!({ "email": "", "age": "21" });
//! let report = schema.validate(values.as_object().unwrap());
//! assert_eq!(report.errors["email"].message, "Email is required");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod error_reporter;
pub mod field;
pub mod form;
pub mod output;
pub mod schema;
pub mod validator;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use config::{Config, ConfigError, ConfigManager};
pub use error::{FormError, SchemaError, SubmitError};
pub use error_reporter::ErrorReporter;
pub use field::{FieldConfig, FieldKind, FormConfig, Messages};
pub use form::{
    Form, FormOptions, FormState, Input, SubmitHandler, SubmitOutcome, ValidationMode, submit_fn,
};
pub use output::Output;
pub use schema::{
    ErrorCode, FieldError, FieldErrors, FieldRule, FieldValue, ParsedValues, Schema,
    ValidationReport, compile_schema,
};
pub use validator::{
    SubmissionResult, SubmissionStatus, ValidationConfig, ValidationEngine, ValidationResults,
};
