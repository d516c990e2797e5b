#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

pub const SIGNUP_TOML: &str = r#"
[fields.email]
type = "email"
label = "Email"
required = true
placeholder = "you@example.com"

[fields.password]
type = "password"
label = "Password"
required = true
min_length = 8
pattern = "[0-9]"

[fields.password.messages]
pattern = "{label} needs at least one digit"

[fields.confirm]
type = "password"
label = "Confirm password"
required = true
matches = "password"

[fields.age]
type = "number"
label = "Age"
min = 13
integer = true

[fields.birthday]
type = "date"
label = "Birthday"
earliest = "1900-01-01"

[fields.terms]
type = "checkbox"
label = "Terms of service"
required = true

[fields.newsletter]
type = "checkbox"
default = true
"#;

/// Temporary directory holding fixture files
pub struct Fixtures {
    pub dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn signup_form(&self) -> PathBuf {
        self.write("signup.toml", SIGNUP_TOML)
    }
}

pub fn valid_signup() -> serde_json::Value {
    serde_json::json!({
        "email": "ada@example.com",
        "password": "analytical1",
        "confirm": "analytical1",
        "age": "36",
        "birthday": "1815-12-10",
        "terms": "on"
    })
}
