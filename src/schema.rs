//! Schema compiler and validator
//!
//! [`compile_schema`] turns a [`FormConfig`] into a [`Schema`]: one [`FieldRule`]
//! per configured field, chosen by a switch on the field kind, with optional
//! threshold and pattern refinements layered on top. Compilation rejects
//! configurations that could never validate anything sensibly (inverted bounds,
//! bad regular expressions, options that do not apply to the field kind).
//!
//! Validation works on raw submitted values (a JSON object, as a browser form
//! or an HTTP body would deliver them) and produces typed [`FieldValue`]s plus
//! at most one [`FieldError`] per field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FormError, Result, SchemaError, SchemaResult};
use crate::field::{FieldConfig, FieldKind, FormConfig, Messages};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identifies which rule rejected a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    Invalid,
    TooShort,
    TooLong,
    TooSmall,
    TooLarge,
    NotInteger,
    TooEarly,
    TooLate,
    Pattern,
    Mismatch,
    /// Set by hand, e.g. from a server response
    Custom,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::Invalid => "invalid",
            ErrorCode::TooShort => "too_short",
            ErrorCode::TooLong => "too_long",
            ErrorCode::TooSmall => "too_small",
            ErrorCode::TooLarge => "too_large",
            ErrorCode::NotInteger => "not_integer",
            ErrorCode::TooEarly => "too_early",
            ErrorCode::TooLate => "too_late",
            ErrorCode::Pattern => "pattern",
            ErrorCode::Mismatch => "mismatch",
            ErrorCode::Custom => "custom",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field's validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Field name to its first validation failure
pub type FieldErrors = BTreeMap<String, FieldError>;

/// A submitted value after successful validation
///
/// Serializes to plain JSON for handlers and reports. There is no way back:
/// an untagged text value such as `"2024-01-01"` cannot be told apart from a
/// date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Optional field left blank
    Empty,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Field name to typed value
pub type ParsedValues = BTreeMap<String, FieldValue>;

/// Outcome of validating a whole submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Typed values of the fields that passed
    pub values: ParsedValues,
    pub errors: FieldErrors,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }
}

#[derive(Debug, Clone)]
enum Rule {
    Textual {
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<Regex>,
        matches: Option<String>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    Date {
        earliest: Option<NaiveDate>,
        latest: Option<NaiveDate>,
    },
    Checkbox,
}

/// Compiled validation rule for one field
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    label: String,
    kind: FieldKind,
    required: bool,
    placeholder: Option<String>,
    default: Option<Value>,
    messages: Messages,
    rule: Rule,
}

impl FieldRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Name of the field this one must equal, if any
    pub fn match_target(&self) -> Option<&str> {
        match &self.rule {
            Rule::Textual { matches, .. } => matches.as_deref(),
            _ => None,
        }
    }

    /// The whole map is needed because `matches` compares against a sibling.
    fn check(
        &self,
        values: &Map<String, Value>,
        labels: &BTreeMap<String, String>,
    ) -> std::result::Result<FieldValue, FieldError> {
        let raw = match values.get(&self.name) {
            Some(raw) if !is_absent(raw) => raw,
            _ => {
                return match (self.kind, self.required) {
                    (_, true) => Err(self.required_error()),
                    (FieldKind::Checkbox, false) => Ok(FieldValue::Bool(false)),
                    (_, false) => Ok(FieldValue::Empty),
                };
            }
        };

        match &self.rule {
            Rule::Textual {
                min_length,
                max_length,
                pattern,
                matches,
            } => {
                let Value::String(text) = raw else {
                    return Err(self.invalid_error());
                };
                if self.kind == FieldKind::Email && !EMAIL_RE.is_match(text) {
                    return Err(self.invalid_error());
                }
                let length = text.chars().count();
                if let Some(min) = min_length
                    && length < *min
                {
                    return Err(self.error(
                        ErrorCode::TooShort,
                        &self.messages.min_length,
                        format!("must be at least {} characters", min),
                    ));
                }
                if let Some(max) = max_length
                    && length > *max
                {
                    return Err(self.error(
                        ErrorCode::TooLong,
                        &self.messages.max_length,
                        format!("must be at most {} characters", max),
                    ));
                }
                if let Some(re) = pattern
                    && !re.is_match(text)
                {
                    return Err(self.error(
                        ErrorCode::Pattern,
                        &self.messages.pattern,
                        "is not in the expected format".to_string(),
                    ));
                }
                if let Some(other) = matches
                    && values.get(other) != Some(raw)
                {
                    let other_label = labels.get(other).map(String::as_str).unwrap_or(other);
                    return Err(self.error(
                        ErrorCode::Mismatch,
                        &self.messages.matches,
                        format!("must match {}", other_label),
                    ));
                }
                Ok(FieldValue::Text(text.clone()))
            }
            Rule::Number { min, max, integer } => {
                let number = parse_number(raw).ok_or_else(|| self.invalid_error())?;
                if let Some(min) = min
                    && number < *min
                {
                    return Err(self.error(
                        ErrorCode::TooSmall,
                        &self.messages.min,
                        format!("must be at least {}", min),
                    ));
                }
                if let Some(max) = max
                    && number > *max
                {
                    return Err(self.error(
                        ErrorCode::TooLarge,
                        &self.messages.max,
                        format!("must be at most {}", max),
                    ));
                }
                if *integer && number.fract() != 0.0 {
                    return Err(self.error(
                        ErrorCode::NotInteger,
                        &self.messages.integer,
                        "must be a whole number".to_string(),
                    ));
                }
                Ok(FieldValue::Number(number))
            }
            Rule::Date { earliest, latest } => {
                let date = match raw {
                    Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
                    _ => None,
                }
                .ok_or_else(|| self.invalid_error())?;
                if let Some(earliest) = earliest
                    && date < *earliest
                {
                    return Err(self.error(
                        ErrorCode::TooEarly,
                        &self.messages.earliest,
                        format!("must be on or after {}", earliest.format(DATE_FORMAT)),
                    ));
                }
                if let Some(latest) = latest
                    && date > *latest
                {
                    return Err(self.error(
                        ErrorCode::TooLate,
                        &self.messages.latest,
                        format!("must be on or before {}", latest.format(DATE_FORMAT)),
                    ));
                }
                Ok(FieldValue::Date(date))
            }
            Rule::Checkbox => {
                let checked = parse_checkbox(raw).ok_or_else(|| self.invalid_error())?;
                if self.required && !checked {
                    return Err(self.required_error());
                }
                Ok(FieldValue::Bool(checked))
            }
        }
    }

    fn required_error(&self) -> FieldError {
        let default = if self.kind == FieldKind::Checkbox {
            "must be checked"
        } else {
            "is required"
        };
        self.error(
            ErrorCode::Required,
            &self.messages.required,
            default.to_string(),
        )
    }

    fn invalid_error(&self) -> FieldError {
        let default = match self.kind {
            FieldKind::Text | FieldKind::Password => "must be text",
            FieldKind::Email => "must be a valid email address",
            FieldKind::Number => "must be a number",
            FieldKind::Date => "must be a valid date",
            FieldKind::Checkbox => "must be true or false",
        };
        self.error(
            ErrorCode::Invalid,
            &self.messages.invalid,
            default.to_string(),
        )
    }

    /// Custom messages may reference the label as `{label}`
    fn error(&self, code: ErrorCode, custom: &Option<String>, default: String) -> FieldError {
        let message = match custom {
            Some(custom) => custom.replace("{label}", &self.label),
            None => format!("{} {}", self.label, default),
        };
        FieldError::new(code, message)
    }
}

/// A compiled form schema
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, FieldRule>,
    labels: BTreeMap<String, String>,
}

impl Schema {
    pub fn from_config(config: &FormConfig) -> SchemaResult<Self> {
        compile_schema(config)
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldRule> {
        self.fields.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Configured defaults of every field that declares one
    pub fn default_values(&self) -> Map<String, Value> {
        self.fields
            .values()
            .filter_map(|rule| {
                rule.default_value()
                    .map(|value| (rule.name.clone(), value.clone()))
            })
            .collect()
    }

    /// Validate a full submission
    pub fn validate(&self, values: &Map<String, Value>) -> ValidationReport {
        let mut report = ValidationReport::default();

        for (name, rule) in &self.fields {
            match rule.check(values, &self.labels) {
                Ok(value) => {
                    report.values.insert(name.clone(), value);
                }
                Err(error) => {
                    report.errors.insert(name.clone(), error);
                }
            }
        }

        debug!(
            fields = self.fields.len(),
            errors = report.errors.len(),
            "validated submission"
        );
        report
    }

    /// Validate one field in the context of the whole submission
    pub fn validate_field(
        &self,
        name: &str,
        values: &Map<String, Value>,
    ) -> Result<Option<FieldError>> {
        let rule = self.fields.get(name).ok_or_else(|| FormError::UnknownField {
            name: name.to_string(),
        })?;
        Ok(rule.check(values, &self.labels).err())
    }

    /// Fields whose `matches` refinement points at `name`
    pub fn dependents_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .values()
            .filter(move |rule| rule.match_target() == Some(name))
            .map(|rule| rule.name.as_str())
    }
}

/// Compile a field configuration into a schema
pub fn compile_schema(config: &FormConfig) -> SchemaResult<Schema> {
    let mut fields = BTreeMap::new();
    let mut labels = BTreeMap::new();

    for (name, field) in &config.fields {
        let rule = compile_field(name, field, config)?;
        labels.insert(name.clone(), rule.label.clone());
        fields.insert(name.clone(), rule);
    }

    debug!(fields = fields.len(), "compiled form schema");
    Ok(Schema { fields, labels })
}

fn compile_field(name: &str, field: &FieldConfig, config: &FormConfig) -> SchemaResult<FieldRule> {
    check_applicable(name, field)?;

    let rule = match field.kind {
        FieldKind::Text | FieldKind::Email | FieldKind::Password => {
            if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
                check_order(name, "min_length", min, "max_length", max)?;
            }
            let pattern = field
                .pattern
                .as_deref()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
                        field: name.to_string(),
                        details: e.to_string(),
                    })
                })
                .transpose()?;
            if let Some(target) = &field.matches {
                if target == name {
                    return Err(SchemaError::SelfMatch {
                        field: name.to_string(),
                    });
                }
                if !config.fields.contains_key(target) {
                    return Err(SchemaError::UnknownMatchTarget {
                        field: name.to_string(),
                        target: target.clone(),
                    });
                }
            }
            Rule::Textual {
                min_length: field.min_length,
                max_length: field.max_length,
                pattern,
                matches: field.matches.clone(),
            }
        }
        FieldKind::Number => {
            for (option, value) in [("min", field.min), ("max", field.max)] {
                if let Some(value) = value
                    && !value.is_finite()
                {
                    return Err(SchemaError::NonFiniteThreshold {
                        field: name.to_string(),
                        option: option.to_string(),
                    });
                }
            }
            if let (Some(min), Some(max)) = (field.min, field.max) {
                check_order(name, "min", min, "max", max)?;
            }
            Rule::Number {
                min: field.min,
                max: field.max,
                integer: field.integer,
            }
        }
        FieldKind::Date => {
            if let (Some(earliest), Some(latest)) = (field.earliest, field.latest) {
                check_order(name, "earliest", earliest, "latest", latest)?;
            }
            Rule::Date {
                earliest: field.earliest,
                latest: field.latest,
            }
        }
        FieldKind::Checkbox => Rule::Checkbox,
    };

    Ok(FieldRule {
        name: name.to_string(),
        label: field.display_label(name).to_string(),
        kind: field.kind,
        required: field.required,
        placeholder: field.placeholder.clone(),
        default: field.default.clone(),
        messages: field.messages.clone(),
        rule,
    })
}

fn check_applicable(name: &str, field: &FieldConfig) -> SchemaResult<()> {
    let kind = field.kind;
    let options = [
        ("min_length", field.min_length.is_some(), kind.is_textual()),
        ("max_length", field.max_length.is_some(), kind.is_textual()),
        ("min", field.min.is_some(), kind == FieldKind::Number),
        ("max", field.max.is_some(), kind == FieldKind::Number),
        ("integer", field.integer, kind == FieldKind::Number),
        ("earliest", field.earliest.is_some(), kind == FieldKind::Date),
        ("latest", field.latest.is_some(), kind == FieldKind::Date),
        (
            "pattern",
            field.pattern.is_some(),
            matches!(kind, FieldKind::Text | FieldKind::Password),
        ),
        ("matches", field.matches.is_some(), kind.is_textual()),
    ];

    for (option, present, applies) in options {
        if present && !applies {
            return Err(SchemaError::InapplicableOption {
                field: name.to_string(),
                kind: kind.to_string(),
                option: option.to_string(),
            });
        }
    }
    Ok(())
}

fn check_order<T: PartialOrd + fmt::Display>(
    name: &str,
    lower_name: &str,
    lower: T,
    upper_name: &str,
    upper: T,
) -> SchemaResult<()> {
    if lower > upper {
        return Err(SchemaError::InvertedThresholds {
            field: name.to_string(),
            lower: format!("{}={}", lower_name, lower),
            upper: format!("{}={}", upper_name, upper),
        });
    }
    Ok(())
}

fn is_absent(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Numbers, dates and checkboxes are parsed from trimmed text; only the typed
/// value is kept, so surrounding whitespace never reaches a handler.
fn parse_number(raw: &Value) -> Option<f64> {
    let number = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

pub(crate) fn parse_checkbox(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" => Some(true),
            "false" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test values must be an object"),
        }
    }

    fn single(config: FieldConfig) -> Schema {
        compile_schema(&FormConfig::new().field("field", config)).unwrap()
    }

    fn error_of(schema: &Schema, value: Value) -> Option<FieldError> {
        schema.validate(&values(json!({ "field": value }))).errors.remove("field")
    }

    #[test]
    fn test_required_and_optional_absence() {
        let required = single(FieldConfig::text().with_label("Name").required());
        for absent in [Value::Null, json!(""), json!("   ")] {
            let error = error_of(&required, absent).unwrap();
            assert_eq!(error.code, ErrorCode::Required);
            assert_eq!(error.message, "Name is required");
        }
        let report = required.validate(&Map::new());
        assert_eq!(report.errors["field"].code, ErrorCode::Required);

        let optional = single(FieldConfig::number().with_min(5.0));
        let report = optional.validate(&Map::new());
        assert!(report.is_valid());
        assert_eq!(report.values["field"], FieldValue::Empty);
    }

    #[test]
    fn test_text_lengths_count_characters() {
        let schema = single(
            FieldConfig::text()
                .with_label("Nickname")
                .with_min_length(3)
                .with_max_length(5),
        );
        assert_eq!(
            error_of(&schema, json!("ab")).unwrap().message,
            "Nickname must be at least 3 characters"
        );
        assert_eq!(
            error_of(&schema, json!("abcdef")).unwrap().message,
            "Nickname must be at most 5 characters"
        );
        // Five characters, more than five bytes
        assert!(error_of(&schema, json!("ééééé")).is_none());
        assert_eq!(
            error_of(&schema, json!(42)).unwrap().code,
            ErrorCode::Invalid
        );
    }

    #[test]
    fn test_email_shape() {
        let schema = single(FieldConfig::email().with_label("Email"));
        assert!(error_of(&schema, json!("user@example.com")).is_none());
        assert!(error_of(&schema, json!("first.last+tag@mail.example.org")).is_none());
        for bad in ["user", "user@", "@example.com", "user@example", "a b@example.com"] {
            let error = error_of(&schema, json!(bad)).unwrap();
            assert_eq!(error.code, ErrorCode::Invalid, "{bad}");
            assert_eq!(error.message, "Email must be a valid email address");
        }
    }

    #[test]
    fn test_email_keeps_surrounding_whitespace() {
        let schema = single(FieldConfig::email().with_label("Email"));
        let error = error_of(&schema, json!(" a@b.co ")).unwrap();
        assert_eq!(error.code, ErrorCode::Invalid);

        let report = schema.validate(&values(json!({ "field": "a@b.co" })));
        assert_eq!(report.values["field"], FieldValue::Text("a@b.co".to_string()));
    }

    #[test]
    fn test_length_counts_untrimmed_text() {
        let schema = single(FieldConfig::text().with_label("Code").with_max_length(3));
        assert!(error_of(&schema, json!("abc")).is_none());
        assert_eq!(
            error_of(&schema, json!(" abc ")).unwrap().code,
            ErrorCode::TooLong
        );

        let schema = single(FieldConfig::text().with_min_length(4));
        let report = schema.validate(&values(json!({ "field": " ab " })));
        assert_eq!(report.values["field"], FieldValue::Text(" ab ".to_string()));
    }

    #[test]
    fn test_pattern_refinement() {
        let schema = single(
            FieldConfig::password()
                .with_label("Password")
                .with_pattern("[0-9]"),
        );
        assert!(error_of(&schema, json!("hunter2")).is_none());
        let error = error_of(&schema, json!("hunter")).unwrap();
        assert_eq!(error.code, ErrorCode::Pattern);
        assert_eq!(error.message, "Password is not in the expected format");
    }

    #[test]
    fn test_number_parsing_and_bounds() {
        let schema = single(
            FieldConfig::number()
                .with_label("Age")
                .with_min(18.0)
                .with_max(130.0)
                .integer(),
        );
        let report = schema.validate(&values(json!({ "field": " 42 " })));
        assert_eq!(report.values["field"], FieldValue::Number(42.0));
        assert!(error_of(&schema, json!(42)).is_none());

        assert_eq!(
            error_of(&schema, json!(17)).unwrap().message,
            "Age must be at least 18"
        );
        assert_eq!(
            error_of(&schema, json!(131)).unwrap().message,
            "Age must be at most 130"
        );
        assert_eq!(
            error_of(&schema, json!(20.5)).unwrap().message,
            "Age must be a whole number"
        );
        // Bounds are checked before integrality
        assert_eq!(
            error_of(&schema, json!(10.5)).unwrap().code,
            ErrorCode::TooSmall
        );
        assert_eq!(
            error_of(&schema, json!("130.5")).unwrap().code,
            ErrorCode::TooLarge
        );
        assert_eq!(
            error_of(&schema, json!("forty")).unwrap().message,
            "Age must be a number"
        );
        assert_eq!(
            error_of(&schema, json!("inf")).unwrap().code,
            ErrorCode::Invalid
        );
        assert_eq!(
            error_of(&schema, json!(true)).unwrap().code,
            ErrorCode::Invalid
        );
    }

    #[test]
    fn test_date_bounds() {
        let schema = single(
            FieldConfig::date()
                .with_label("Start")
                .with_earliest(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
                .with_latest(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()),
        );
        let report = schema.validate(&values(json!({ "field": "2024-06-15" })));
        assert_eq!(
            report.values["field"],
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        );
        assert!(error_of(&schema, json!("2024-01-01")).is_none());
        assert!(error_of(&schema, json!("2024-12-31")).is_none());
        assert_eq!(
            error_of(&schema, json!("2023-12-31")).unwrap().message,
            "Start must be on or after 2024-01-01"
        );
        assert_eq!(
            error_of(&schema, json!("2025-01-01")).unwrap().message,
            "Start must be on or before 2024-12-31"
        );
        assert_eq!(
            error_of(&schema, json!("2024-02-30")).unwrap().message,
            "Start must be a valid date"
        );
    }

    #[test]
    fn test_checkbox() {
        let required = single(FieldConfig::checkbox().with_label("Terms").required());
        assert_eq!(
            error_of(&required, json!(false)).unwrap().message,
            "Terms must be checked"
        );
        assert_eq!(
            required.validate(&Map::new()).errors["field"].code,
            ErrorCode::Required
        );
        assert!(error_of(&required, json!("on")).is_none());
        assert_eq!(
            error_of(&required, json!("maybe")).unwrap().message,
            "Terms must be true or false"
        );

        for unchecked in ["false", "off", " OFF "] {
            assert_eq!(
                error_of(&required, json!(unchecked)).unwrap().code,
                ErrorCode::Required,
                "{unchecked}"
            );
        }

        let optional = single(FieldConfig::checkbox());
        let report = optional.validate(&Map::new());
        assert_eq!(report.values["field"], FieldValue::Bool(false));
        for (raw, expected) in [("off", false), ("false", false), ("on", true), ("true", true)] {
            let report = optional.validate(&values(json!({ "field": raw })));
            assert_eq!(report.values["field"], FieldValue::Bool(expected), "{raw}");
        }
    }

    #[test]
    fn test_matches_refinement() {
        let config = FormConfig::new()
            .field("password", FieldConfig::password().with_label("Password"))
            .field(
                "confirm",
                FieldConfig::password()
                    .with_label("Confirmation")
                    .matching("password"),
            );
        let schema = compile_schema(&config).unwrap();

        let ok = schema.validate(&values(json!({ "password": "s3cret", "confirm": "s3cret" })));
        assert!(ok.is_valid());

        let bad = schema.validate(&values(json!({ "password": "s3cret", "confirm": "other" })));
        let error = bad.error("confirm").unwrap();
        assert_eq!(error.code, ErrorCode::Mismatch);
        assert_eq!(error.message, "Confirmation must match Password");

        assert_eq!(schema.dependents_of("password").collect::<Vec<_>>(), vec!["confirm"]);
    }

    #[test]
    fn test_custom_messages() {
        let schema = single(
            FieldConfig::text()
                .with_label("Handle")
                .required()
                .with_min_length(2)
                .with_messages(Messages {
                    required: Some("Please pick a {label}".to_string()),
                    min_length: Some("Too short".to_string()),
                    ..Messages::default()
                }),
        );
        assert_eq!(
            error_of(&schema, Value::Null).unwrap().message,
            "Please pick a Handle"
        );
        assert_eq!(error_of(&schema, json!("a")).unwrap().message, "Too short");
    }

    #[test]
    fn test_label_defaults_to_field_name() {
        let schema = single(FieldConfig::text().required());
        assert_eq!(
            error_of(&schema, Value::Null).unwrap().message,
            "field is required"
        );
    }

    #[test]
    fn test_unconfigured_keys_ignored() {
        let schema = single(FieldConfig::text());
        let report = schema.validate(&values(json!({ "field": "x", "extra": 1 })));
        assert!(report.is_valid());
        assert!(!report.values.contains_key("extra"));
    }

    #[test]
    fn test_compile_rejects_bad_configs() {
        let bad_regex = FormConfig::new().field("a", FieldConfig::text().with_pattern("("));
        assert!(matches!(
            compile_schema(&bad_regex),
            Err(SchemaError::InvalidPattern { .. })
        ));

        let inverted = FormConfig::new().field("a", FieldConfig::number().with_min(5.0).with_max(1.0));
        assert!(matches!(
            compile_schema(&inverted),
            Err(SchemaError::InvertedThresholds { .. })
        ));

        let inverted_len = FormConfig::new().field(
            "a",
            FieldConfig::text().with_min_length(5).with_max_length(1),
        );
        assert!(matches!(
            compile_schema(&inverted_len),
            Err(SchemaError::InvertedThresholds { .. })
        ));

        let inverted_dates = FormConfig::new().field(
            "a",
            FieldConfig::date()
                .with_earliest(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
                .with_latest(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        );
        assert_eq!(
            compile_schema(&inverted_dates).unwrap_err(),
            SchemaError::InvertedThresholds {
                field: "a".to_string(),
                lower: "earliest=2025-01-01".to_string(),
                upper: "latest=2024-01-01".to_string(),
            }
        );

        let nan = FormConfig::new().field("a", FieldConfig::number().with_max(f64::NAN));
        assert!(matches!(
            compile_schema(&nan),
            Err(SchemaError::NonFiniteThreshold { .. })
        ));

        let pattern_on_number = FormConfig::new().field("a", FieldConfig::number().with_pattern("x"));
        assert_eq!(
            compile_schema(&pattern_on_number).unwrap_err(),
            SchemaError::InapplicableOption {
                field: "a".to_string(),
                kind: "number".to_string(),
                option: "pattern".to_string(),
            }
        );

        let pattern_on_email = FormConfig::new().field("a", FieldConfig::email().with_pattern("x"));
        assert!(matches!(
            compile_schema(&pattern_on_email),
            Err(SchemaError::InapplicableOption { .. })
        ));

        let matches_on_number = FormConfig::new()
            .field("a", FieldConfig::number().matching("b"))
            .field("b", FieldConfig::number());
        assert_eq!(
            compile_schema(&matches_on_number).unwrap_err(),
            SchemaError::InapplicableOption {
                field: "a".to_string(),
                kind: "number".to_string(),
                option: "matches".to_string(),
            }
        );

        let unknown_target = FormConfig::new().field("a", FieldConfig::text().matching("b"));
        assert!(matches!(
            compile_schema(&unknown_target),
            Err(SchemaError::UnknownMatchTarget { .. })
        ));

        let self_match = FormConfig::new().field("a", FieldConfig::text().matching("a"));
        assert!(matches!(
            compile_schema(&self_match),
            Err(SchemaError::SelfMatch { .. })
        ));
    }

    #[test]
    fn test_validate_field_unknown() {
        let schema = single(FieldConfig::text());
        assert!(matches!(
            schema.validate_field("nope", &Map::new()),
            Err(FormError::UnknownField { .. })
        ));
        assert_eq!(schema.validate_field("field", &Map::new()).unwrap(), None);
    }

    #[test]
    fn test_parsed_values_serialize() {
        let config = FormConfig::new()
            .field("name", FieldConfig::text())
            .field("age", FieldConfig::number())
            .field("when", FieldConfig::date())
            .field("ok", FieldConfig::checkbox());
        let schema = compile_schema(&config).unwrap();
        let report = schema.validate(&values(json!({ "age": "7", "when": "2024-03-01" })));
        let serialized = serde_json::to_value(&report.values).unwrap();
        assert_eq!(
            serialized,
            json!({ "age": 7.0, "name": null, "ok": false, "when": "2024-03-01" })
        );
    }

    #[test]
    fn test_date_like_text_serializes_as_text() {
        let schema = single(FieldConfig::text());
        let report = schema.validate(&values(json!({ "field": "2024-01-01" })));
        assert_eq!(
            report.values["field"],
            FieldValue::Text("2024-01-01".to_string())
        );
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({ "values": { "field": "2024-01-01" }, "errors": {} })
        );
    }
}
