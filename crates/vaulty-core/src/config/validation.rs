//! Strict validation of the configuration input
//!
//! Works on a [`serde_json::Value`] so every violation can be reported at
//! once, with its key path, instead of stopping at the first serde error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use super::SecretConfig;

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\.?[a-z0-9\-_]+$").unwrap());

const CONFIG_KEYS: &[&str] = &["extension", "gitignore", "ignoreFiles", "secrets"];
const SECRET_KEYS: &[&str] = &["address", "namespace", "path", "token"];

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted key path, empty for the root.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "- {}", self.message)
        } else {
            write!(f, "- {}: {}", self.path, self.message)
        }
    }
}

/// Render violations as the bullet list used in issue messages.
pub fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validated, normalized configuration input. Absent keys stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigInput {
    pub extension: Option<String>,
    pub gitignore: Option<bool>,
    pub ignore_files: Option<Vec<String>>,
    pub secrets: Option<BTreeMap<String, SecretConfig>>,
}

#[derive(Default)]
struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn report(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn unknown_keys(&mut self, path: &str, object: &Map<String, Value>, allowed: &[&str]) {
        let unknown: Vec<String> = object
            .keys()
            .filter(|key| !allowed.contains(&key.as_str()))
            .map(|key| format!("'{key}'"))
            .collect();
        if !unknown.is_empty() {
            self.report(
                path,
                format!("Unrecognized key(s) in object: {}", unknown.join(", ")),
            );
        }
    }

    fn string(&mut self, path: &str, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.report(
                    path,
                    format!("Expected string, received {}", type_name(other)),
                );
                None
            }
        }
    }

    fn required_string(
        &mut self,
        path: &str,
        object: &Map<String, Value>,
        key: &str,
    ) -> Option<String> {
        let path = join(path, key);
        match object.get(key) {
            Some(value) => self.string(&path, value),
            None => {
                self.report(&path, "Required");
                None
            }
        }
    }

    fn extension(&mut self, value: &Value) -> Option<String> {
        let raw = self.string("extension", value)?;
        match normalize_extension(&raw) {
            Some(extension) => Some(extension),
            None => {
                self.report(
                    "extension",
                    "The extension name must be a valid file extension.",
                );
                None
            }
        }
    }

    fn ignore_files(&mut self, value: &Value) -> Option<Vec<String>> {
        let Value::Array(items) = value else {
            self.report(
                "ignoreFiles",
                format!("Expected array, received {}", type_name(value)),
            );
            return None;
        };

        let mut files = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(file) = self.string(&format!("ignoreFiles.{index}"), item) {
                files.push(file);
            }
        }
        Some(files)
    }

    fn address(&mut self, path: &str, object: &Map<String, Value>) -> Option<String> {
        let raw = self.required_string(path, object, "address")?;
        match Url::parse(&raw) {
            Ok(url) => Some(url.to_string()),
            Err(_) => {
                self.report(&join(path, "address"), "Invalid URL format");
                None
            }
        }
    }

    fn secret(&mut self, path: &str, value: &Value) -> Option<SecretConfig> {
        let Value::Object(object) = value else {
            self.report(path, format!("Expected object, received {}", type_name(value)));
            return None;
        };
        self.unknown_keys(path, object, SECRET_KEYS);

        let address = self.address(path, object);
        let namespace = match object.get("namespace") {
            None => None,
            Some(value) => self.string(&join(path, "namespace"), value),
        };
        let secret_path = self.required_string(path, object, "path");
        let token = self.required_string(path, object, "token");

        Some(SecretConfig {
            address: address?,
            namespace,
            path: secret_path?,
            token: token?,
        })
    }

    fn secrets(&mut self, value: &Value) -> Option<BTreeMap<String, SecretConfig>> {
        let Value::Object(object) = value else {
            self.report(
                "secrets",
                format!("Expected object, received {}", type_name(value)),
            );
            return None;
        };

        let mut secrets = BTreeMap::new();
        for (name, secret) in object {
            if let Some(secret) = self.secret(&join("secrets", name), secret) {
                secrets.insert(name.clone(), secret);
            }
        }
        Some(secrets)
    }
}

/// Validate a raw configuration object.
///
/// `null` is treated as an empty configuration.
pub fn validate(value: &Value) -> Result<ConfigInput, Vec<Violation>> {
    let empty = Map::new();
    let object = match value {
        Value::Null => &empty,
        Value::Object(object) => object,
        other => {
            return Err(vec![Violation {
                path: String::new(),
                message: format!("Expected object, received {}", type_name(other)),
            }]);
        }
    };

    let mut validator = Validator::default();
    validator.unknown_keys("", object, CONFIG_KEYS);

    let input = ConfigInput {
        extension: object.get("extension").and_then(|v| validator.extension(v)),
        gitignore: object.get("gitignore").map(truthy),
        ignore_files: object
            .get("ignoreFiles")
            .and_then(|v| validator.ignore_files(v)),
        secrets: object.get("secrets").and_then(|v| validator.secrets(v)),
    };

    if validator.violations.is_empty() {
        Ok(input)
    } else {
        Err(validator.violations)
    }
}

/// Strip whitespace, prefix a dot and lower-case. `None` if the result is
/// not a usable file extension.
pub fn normalize_extension(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let dotted = if compact.starts_with('.') {
        compact
    } else {
        format!(".{compact}")
    };
    let extension = dotted.to_lowercase();
    EXTENSION_RE.is_match(&extension).then_some(extension)
}

/// Boolean coercion with the usual scripting truthiness rules.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
