//! Template engine
//!
//! One minijinja environment per context, loading templates from the project
//! root. Output is never escaped and undefined lookups chain to empty output.

use std::fmt::Display;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use minijinja::value::{Kwargs, Value, ValueKind};
use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};

use super::filters::{self, CipherOptions, DateInput, FilterResult};

fn filter_error(name: &str, message: impl Display) -> Error {
    Error::new(ErrorKind::InvalidOperation, format!("{name} filter: {message}"))
}

/// Text of a template value as a filter sees it.
fn text(value: &Value) -> FilterResult<String> {
    if value.is_undefined() {
        return Err("value is undefined".to_string());
    }
    Ok(display(value))
}

fn display(value: &Value) -> String {
    if value.is_none() {
        return "null".to_string();
    }
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

fn date_input(value: &Value) -> FilterResult<DateInput<'_>> {
    if value.is_undefined() {
        return Ok(DateInput::Now);
    }
    if let Some(text) = value.as_str() {
        return Ok(DateInput::Text(text));
    }
    if value.kind() == ValueKind::Number {
        if let Ok(millis) = i64::try_from(value.clone()) {
            return Ok(DateInput::Millis(millis));
        }
        if let Ok(millis) = f64::try_from(value.clone()) {
            return Ok(DateInput::Millis(millis as i64));
        }
    }
    Err("Invalid Date".to_string())
}

/// Cipher options from an optional positional object and keyword arguments.
/// Keyword arguments win.
fn cipher_options(options: Option<&Value>, kwargs: &Kwargs) -> Result<CipherOptions, Error> {
    let mut resolved = CipherOptions::default();
    for key in ["secret", "iv", "algorithm"] {
        let positional = options
            .and_then(|options| options.get_attr(key).ok())
            .filter(|value| !value.is_undefined() && !value.is_none())
            .map(|value| display(&value));
        let keyword: Option<String> = kwargs.get(key)?;
        let Some(value) = keyword.or(positional) else {
            continue;
        };
        match key {
            "secret" => resolved.secret = value,
            "iv" => resolved.iv = value,
            _ => resolved.algorithm = value,
        }
    }
    kwargs.assert_all_used()?;
    Ok(resolved)
}

fn key_value(value: &Value) -> FilterResult<String> {
    if value.kind() != ValueKind::Map {
        return Err("expected an object".to_string());
    }
    let mut pairs = Vec::new();
    for key in value.try_iter().map_err(|e| e.to_string())? {
        let item = value.get_item(&key).map_err(|e| e.to_string())?;
        pairs.push((display(&key), display(&item)));
    }
    Ok(filters::key_value(pairs))
}

fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("encodeURIComponent", |value: Value| {
        text(&value)
            .map(|text| filters::encode_uri_component(&text))
            .map_err(|e| filter_error("encodeURIComponent", e))
    });
    env.add_filter("decodeURIComponent", |value: Value| {
        text(&value)
            .and_then(|text| filters::decode_uri_component(&text))
            .map_err(|e| filter_error("decodeURIComponent", e))
    });
    env.add_filter("base64encode", |value: Value| {
        text(&value)
            .map(|text| filters::base64_encode(&text))
            .map_err(|e| filter_error("base64encode", e))
    });
    env.add_filter("base64decode", |value: Value| {
        text(&value)
            .and_then(|text| filters::base64_decode(&text))
            .map_err(|e| filter_error("base64decode", e))
    });
    env.add_filter("hash", |value: Value, algorithm: Option<String>| {
        let algorithm = algorithm.as_deref().unwrap_or(filters::DEFAULT_HASH);
        text(&value)
            .and_then(|text| filters::hash(&text, algorithm))
            .map_err(|e| filter_error("hash", e))
    });
    env.add_filter(
        "encrypt",
        |value: Value, options: Option<Value>, kwargs: Kwargs| {
            let options =
                cipher_options(options.as_ref(), &kwargs).map_err(|e| filter_error("encrypt", e))?;
            text(&value)
                .and_then(|text| filters::encrypt(&text, &options))
                .map_err(|e| filter_error("encrypt", e))
        },
    );
    env.add_filter(
        "decrypt",
        |value: Value, options: Option<Value>, kwargs: Kwargs| {
            let options =
                cipher_options(options.as_ref(), &kwargs).map_err(|e| filter_error("decrypt", e))?;
            text(&value)
                .and_then(|text| filters::decrypt(&text, &options))
                .map_err(|e| filter_error("decrypt", e))
        },
    );
    env.add_filter("formatDate", |value: Value, format: Option<String>| {
        let format = format.as_deref().unwrap_or(filters::DEFAULT_DATE_FORMAT);
        date_input(&value)
            .and_then(|input| filters::format_date(input, format))
            .map_err(|e| filter_error("formatDate", e))
    });
    env.add_filter("json", |value: Value, indent: Option<usize>| {
        filters::to_json(&value, indent.unwrap_or(filters::DEFAULT_JSON_INDENT))
            .map_err(|e| filter_error("json", e))
    });
    env.add_filter("yaml", |value: Value| {
        filters::to_yaml(&value).map_err(|e| filter_error("yaml", e))
    });
    env.add_filter("keyValue", |value: Value| {
        key_value(&value).map_err(|e| filter_error("keyValue", e))
    });
}

/// Resolve a template name below `root`.
///
/// Names are `/`-separated and relative. Dot-prefixed segments such as
/// `.env.vaulty` are allowed; empty, `.` and `..` segments are not.
fn template_path(root: &Path, name: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in name.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

fn load_template(root: &Path, name: &str) -> Result<Option<String>, Error> {
    let Some(path) = template_path(root, name) else {
        return Ok(None);
    };
    match std::fs::read_to_string(&path) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", path.display()),
        )
        .with_source(e)),
    }
}

/// Environment loading templates from `root`.
pub fn build_engine(root: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    let base = root.to_path_buf();
    env.set_loader(move |name| load_template(&base, name));
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    register_filters(&mut env);
    tracing::debug!(root = %root.display(), "template engine ready");
    env
}
