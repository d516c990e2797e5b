//! Declarative field configuration
//!
//! A form is described by a mapping of field name to [`FieldConfig`]. The
//! mapping is usually loaded from a TOML or JSON file:
//!
//! ```toml
//! [fields.email]
//! type = "email"
//! label = "Email address"
//! required = true
//!
//! [fields.age]
//! type = "number"
//! min = 18
//! integer = true
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FormError, Result};

/// The closed set of supported field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Number,
    Date,
    Checkbox,
}

impl FieldKind {
    /// Name used both in configuration files and as the input type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Password => "password",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Checkbox => "checkbox",
        }
    }

    /// Whether values of this kind are free-form strings
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldKind::Text | FieldKind::Email | FieldKind::Password
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-rule overrides for the generated error messages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Messages {
    pub required: Option<String>,
    pub invalid: Option<String>,
    pub min_length: Option<String>,
    pub max_length: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub integer: Option<String>,
    pub earliest: Option<String>,
    pub latest: Option<String>,
    pub pattern: Option<String>,
    pub matches: Option<String>,
}

/// Configuration of a single form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub integer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Name of another field this one must equal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub messages: Messages,
}

impl FieldConfig {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            label: None,
            required: false,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            integer: false,
            earliest: None,
            latest: None,
            pattern: None,
            matches: None,
            placeholder: None,
            default: None,
            messages: Messages::default(),
        }
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    pub fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    pub fn password() -> Self {
        Self::new(FieldKind::Password)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn checkbox() -> Self {
        Self::new(FieldKind::Checkbox)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn with_earliest(mut self, earliest: NaiveDate) -> Self {
        self.earliest = Some(earliest);
        self
    }

    pub fn with_latest(mut self, latest: NaiveDate) -> Self {
        self.latest = Some(latest);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn matching(mut self, other: impl Into<String>) -> Self {
        self.matches = Some(other.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// Label shown to users, falling back to the field name
    pub fn display_label<'a>(&'a self, name: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(name)
    }
}

/// A complete form description: field name to field configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
}

impl FormConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, config: FieldConfig) -> Self {
        self.fields.insert(name.into(), config);
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a form description from a file (TOML or JSON)
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            Some(ext) => Err(FormError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = Self::from_toml_str(&content) {
                    Ok(config)
                } else {
                    Self::from_json_str(&content)
                }
            }
        }
    }
}
