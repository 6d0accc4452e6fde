//! Configuration document
//!
//! Renders normalized parameters as the YAML document the simulation reads,
//! and parses such a document back into parameters.
//!
//! Rendering rules:
//! - one `key: value` line per parameter, in insertion order
//! - floats always carry a fractional part (`0.0`, never `0`)
//! - non-ASCII text is written verbatim
//! - no scalar is ever folded across lines

use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::LazyLock;
use thiserror::Error;

use crate::domain::params::Parameters;

/// Errors raised while rendering or parsing a configuration document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to render configuration value: {0}")]
    Render(#[source] serde_yaml::Error),

    #[error("failed to parse configuration document: {0}")]
    Parse(#[source] serde_yaml::Error),
}

/// Renders parameters as a block-style YAML mapping.
pub fn render(params: &Parameters) -> Result<String, DocumentError> {
    if params.is_empty() {
        return Ok("{}\n".to_string());
    }

    let mut doc = String::new();
    for (key, value) in params {
        doc.push_str(&render_string(key)?);
        doc.push_str(": ");
        doc.push_str(&render_value(value)?);
        doc.push('\n');
    }

    Ok(doc)
}

/// Parses a configuration document back into ordered parameters.
pub fn parse(doc: &str) -> Result<Parameters, DocumentError> {
    serde_yaml::from_str(doc).map_err(DocumentError::Parse)
}

fn render_value(value: &JsonValue) -> Result<String, DocumentError> {
    match value {
        JsonValue::Null => Ok("null".to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => Ok(render_float(f)),
            _ => Ok(n.to_string()),
        },
        JsonValue::String(s) => render_string(s),
        // JSON flow syntax is valid YAML and keeps nested values on one line
        JsonValue::Array(_) | JsonValue::Object(_) => Ok(value.to_string()),
    }
}

/// Renders a float with at least one digit after the decimal point.
pub fn render_float(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_positive() {
            ".inf".to_string()
        } else {
            "-.inf".to_string()
        };
    }

    // Display never uses exponent notation for f64
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Plain scalars that a YAML 1.1 reader resolves to something other than a
/// string: booleans, nulls, merge/value keys, underscored or sexagesimal
/// numbers, and timestamps. The YAML 1.2 emitter leaves these unquoted.
static YAML11_NON_STRING: LazyLock<Regex> = LazyLock::new(|| {
    let patterns = [
        r"y|Y|yes|Yes|YES|n|N|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF",
        r"~|null|Null|NULL|<<|=",
        r"[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+",
        r"[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+",
        r"[-+]?[0-9][0-9_]*\.[0-9_]*(?:[eE][-+][0-9]+)?|\.[0-9_]+(?:[eE][-+][0-9]+)?",
        r"[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*",
        r"[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN)",
        r"[0-9]{4}-[0-9]{2}-[0-9]{2}",
        r"[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?",
    ];
    let alternation = patterns.join("|");
    Regex::new(&format!("^(?:{})$", alternation)).expect("valid YAML 1.1 resolver pattern")
});

/// Renders a string scalar on a single line.
///
/// The YAML emitter decides between plain and quoted style (so `"true"` or
/// `"24"` stay strings). Plain output that a YAML 1.1 reader would still
/// resolve to a non-string is single-quoted. Anything the emitter would
/// spread over several lines is written as a double-quoted JSON string instead.
fn render_string(value: &str) -> Result<String, DocumentError> {
    if !value.chars().any(char::is_control) {
        let emitted = serde_yaml::to_string(value).map_err(DocumentError::Render)?;
        let scalar = strip_document_markers(&emitted);
        if !scalar.contains('\n') {
            if scalar == value && YAML11_NON_STRING.is_match(scalar) {
                return Ok(format!("'{}'", value.replace('\'', "''")));
            }
            return Ok(scalar.to_string());
        }
    }

    Ok(JsonValue::String(value.to_string()).to_string())
}

fn strip_document_markers(emitted: &str) -> &str {
    let scalar = emitted.trim_end_matches('\n');
    let scalar = scalar.strip_suffix("\n...").unwrap_or(scalar);
    scalar.strip_prefix("--- ").unwrap_or(scalar)
}
