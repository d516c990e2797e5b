//! Headless form state bound to a compiled [`Schema`]
//!
//! [`Form`] owns the current values, per-field errors, touched/dirty tracking
//! and submission bookkeeping. [`Input`] is the read-only view a renderer needs
//! for one field: label, input type, current value and error text. Nothing in
//! this module renders anything.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{FormError, Result, SubmitError};
use crate::field::FieldKind;
use crate::schema::{
    ErrorCode, FieldError, FieldErrors, FieldRule, ParsedValues, Schema, parse_checkbox,
};

/// When field-level validation runs before the first submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Only on submit; afterwards every change re-validates
    #[default]
    OnSubmit,
    OnChange,
    OnBlur,
    /// First on blur, then on every change of a touched field
    OnTouched,
    /// On both change and blur
    All,
}

#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    pub mode: ValidationMode,
    /// Overrides the defaults declared in the field configuration
    pub default_values: Map<String, Value>,
}

/// Receives the typed values of a valid submission
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: &ParsedValues) -> std::result::Result<(), SubmitError>;
}

/// Adapter turning a plain closure into a [`SubmitHandler`]
pub struct FnHandler<F>(F);

pub fn submit_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&ParsedValues) -> std::result::Result<(), SubmitError> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> SubmitHandler for FnHandler<F>
where
    F: Fn(&ParsedValues) -> std::result::Result<(), SubmitError> + Send + Sync,
{
    async fn submit(&self, values: &ParsedValues) -> std::result::Result<(), SubmitError> {
        (self.0)(values)
    }
}

/// Result of [`Form::handle_submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Values were valid and the handler accepted them
    Submitted,
    /// Validation failed; the handler was not called
    Invalid(FieldErrors),
    /// Values were valid but the handler reported a failure
    Failed(SubmitError),
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted)
    }
}

/// Snapshot of the form's bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    pub errors: FieldErrors,
    pub root_error: Option<String>,
    pub touched: BTreeSet<String>,
    pub dirty: BTreeSet<String>,
    pub submit_count: u32,
    pub is_submitting: bool,
    pub is_submitted: bool,
    pub is_submit_successful: bool,
    pub is_valid: bool,
    pub is_dirty: bool,
}

pub struct Form {
    schema: Arc<Schema>,
    mode: ValidationMode,
    default_values: Map<String, Value>,
    values: Map<String, Value>,
    errors: FieldErrors,
    root_error: Option<String>,
    touched: BTreeSet<String>,
    dirty: BTreeSet<String>,
    submit_count: u32,
    is_submitting: bool,
    is_submit_successful: bool,
}

impl Form {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self::with_options(schema, FormOptions::default())
    }

    pub fn with_options(schema: impl Into<Arc<Schema>>, options: FormOptions) -> Self {
        let schema = schema.into();
        let mut default_values = schema.default_values();
        default_values.extend(options.default_values);

        Self {
            values: default_values.clone(),
            schema,
            mode: options.mode,
            default_values,
            errors: FieldErrors::new(),
            root_error: None,
            touched: BTreeSet::new(),
            dirty: BTreeSet::new(),
            submit_count: 0,
            is_submitting: false,
            is_submit_successful: false,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Update a field's value, validating it if the mode asks for it
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.rule(name)?;
        let value = value.into();

        if self.default_values.get(name) == Some(&value)
            || (!self.default_values.contains_key(name) && value.is_null())
        {
            self.dirty.remove(name);
        } else {
            self.dirty.insert(name.to_string());
        }
        self.values.insert(name.to_string(), value);

        let validate = match self.mode {
            ValidationMode::OnChange | ValidationMode::All => true,
            ValidationMode::OnTouched => self.touched.contains(name),
            ValidationMode::OnSubmit | ValidationMode::OnBlur => false,
        } || self.submit_count > 0;

        if validate {
            self.validate_with_dependents(name)?;
        }
        Ok(())
    }

    /// Mark a field as touched, validating it if the mode asks for it
    pub fn blur(&mut self, name: &str) -> Result<()> {
        self.rule(name)?;
        self.touched.insert(name.to_string());

        if matches!(
            self.mode,
            ValidationMode::OnBlur | ValidationMode::OnTouched | ValidationMode::All
        ) {
            self.validate_one(name)?;
        }
        Ok(())
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Validate one field now; returns whether it is valid
    pub fn trigger(&mut self, name: &str) -> Result<bool> {
        self.validate_one(name)?;
        Ok(!self.errors.contains_key(name))
    }

    /// Validate every field now; returns whether the form is valid
    pub fn trigger_all(&mut self) -> bool {
        self.errors = self.schema.validate(&self.values).errors;
        self.errors.is_empty()
    }

    /// Attach a custom error to a field
    pub fn set_error(&mut self, name: &str, message: impl Into<String>) -> Result<()> {
        self.rule(name)?;
        self.errors.insert(
            name.to_string(),
            FieldError::new(ErrorCode::Custom, message),
        );
        Ok(())
    }

    pub fn clear_error(&mut self, name: &str) {
        self.errors.remove(name);
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
        self.root_error = None;
    }

    pub fn error(&self, name: &str) -> Option<&FieldError> {
        self.errors.get(name)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Failure reported by the last submit handler, if any
    pub fn root_error(&self) -> Option<&str> {
        self.root_error.as_deref()
    }

    /// Whether no errors are currently recorded
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_field_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    pub fn state(&self) -> FormState {
        FormState {
            errors: self.errors.clone(),
            root_error: self.root_error.clone(),
            touched: self.touched.clone(),
            dirty: self.dirty.clone(),
            submit_count: self.submit_count,
            is_submitting: self.is_submitting,
            is_submitted: self.submit_count > 0,
            is_submit_successful: self.is_submit_successful,
            is_valid: self.is_valid(),
            is_dirty: self.is_dirty(),
        }
    }

    /// Restore default values and clear all bookkeeping
    pub fn reset(&mut self) {
        self.values = self.default_values.clone();
        self.errors.clear();
        self.root_error = None;
        self.touched.clear();
        self.dirty.clear();
        self.submit_count = 0;
        self.is_submitting = false;
        self.is_submit_successful = false;
    }

    /// Replace the defaults, then reset to them
    pub fn reset_to(&mut self, values: Map<String, Value>) {
        self.default_values = values;
        self.reset();
    }

    /// Validate everything and hand the typed values to `handler` when valid
    pub async fn handle_submit<H>(&mut self, handler: &H) -> SubmitOutcome
    where
        H: SubmitHandler + ?Sized,
    {
        self.is_submitting = true;
        self.is_submit_successful = false;
        self.root_error = None;
        self.submit_count += 1;

        let report = self.schema.validate(&self.values);
        self.errors = report.errors;

        let outcome = if !self.errors.is_empty() {
            debug!(
                errors = self.errors.len(),
                submit_count = self.submit_count,
                "submission rejected by schema"
            );
            SubmitOutcome::Invalid(self.errors.clone())
        } else {
            match handler.submit(&report.values).await {
                Ok(()) => {
                    debug!(submit_count = self.submit_count, "submission accepted");
                    self.is_submit_successful = true;
                    SubmitOutcome::Submitted
                }
                Err(err) => {
                    warn!(error = %err, "submit handler failed");
                    self.root_error = Some(err.message.clone());
                    SubmitOutcome::Failed(err)
                }
            }
        };

        self.is_submitting = false;
        outcome
    }

    /// Binding for one field, or `None` if the field is not configured
    pub fn input(&self, name: &str) -> Option<Input<'_>> {
        self.schema
            .field(name)
            .map(|rule| Input { form: self, rule })
    }

    /// Bindings for every configured field, ordered by name
    pub fn inputs(&self) -> impl Iterator<Item = Input<'_>> {
        self.schema.fields().map(|rule| Input { form: self, rule })
    }

    fn rule(&self, name: &str) -> Result<&FieldRule> {
        self.schema.field(name).ok_or_else(|| FormError::UnknownField {
            name: name.to_string(),
        })
    }

    fn validate_one(&mut self, name: &str) -> Result<()> {
        match self.schema.validate_field(name, &self.values)? {
            Some(error) => {
                self.errors.insert(name.to_string(), error);
            }
            None => {
                self.errors.remove(name);
            }
        }
        Ok(())
    }

    /// Also re-checks fields that must match `name` and currently fail
    fn validate_with_dependents(&mut self, name: &str) -> Result<()> {
        self.validate_one(name)?;

        let stale: Vec<String> = self
            .schema
            .dependents_of(name)
            .filter(|dependent| self.errors.contains_key(*dependent))
            .map(str::to_string)
            .collect();
        for dependent in stale {
            self.validate_one(&dependent)?;
        }
        Ok(())
    }
}

/// Read-only view of one field for rendering
#[derive(Clone, Copy)]
pub struct Input<'a> {
    form: &'a Form,
    rule: &'a FieldRule,
}

impl<'a> Input<'a> {
    pub fn name(&self) -> &'a str {
        self.rule.name()
    }

    pub fn label(&self) -> &'a str {
        self.rule.label()
    }

    pub fn kind(&self) -> FieldKind {
        self.rule.kind()
    }

    pub fn input_type(&self) -> &'static str {
        self.rule.kind().as_str()
    }

    pub fn required(&self) -> bool {
        self.rule.is_required()
    }

    pub fn placeholder(&self) -> Option<&'a str> {
        self.rule.placeholder()
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.form.values.get(self.rule.name())
    }

    /// Current value as the text an input element would show
    pub fn display_value(&self) -> String {
        match self.value() {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn checked(&self) -> bool {
        self.value().and_then(parse_checkbox).unwrap_or(false)
    }

    pub fn error(&self) -> Option<&'a FieldError> {
        self.form.errors.get(self.rule.name())
    }

    pub fn error_message(&self) -> Option<&'a str> {
        self.error().map(|e| e.message.as_str())
    }

    pub fn is_invalid(&self) -> bool {
        self.error().is_some()
    }

    pub fn is_touched(&self) -> bool {
        self.form.is_touched(self.rule.name())
    }

    pub fn is_dirty(&self) -> bool {
        self.form.is_field_dirty(self.rule.name())
    }

    /// Identifier for the element holding the error text
    pub fn error_id(&self) -> String {
        format!("{}-error", self.rule.name())
    }
}
