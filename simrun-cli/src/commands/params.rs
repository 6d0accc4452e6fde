//! Parameter arguments shared by `run` and `job submit`

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::Value as JsonValue;
use simrun_core::domain::params::Parameters;
use std::path::PathBuf;

/// Simulation parameters collected from a JSON file and/or `--set` pairs
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// JSON file holding a parameter object
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Parameters as key=value pairs (e.g., --set discount_rate=5 --set solver=highs)
    #[arg(short, long, value_parser = parse_key_val)]
    pub set: Vec<(String, JsonValue)>,
}

impl ParamArgs {
    /// Merge the file (if any) and `--set` pairs into one parameter object
    ///
    /// `--set` pairs are applied after the file, so they override its entries.
    pub fn into_parameters(self) -> Result<Parameters> {
        let mut parameters = match &self.file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;
                parse_parameter_object(&content)
                    .with_context(|| format!("Invalid parameter file: {}", path.display()))?
            }
            None => Parameters::new(),
        };

        for (key, value) in self.set {
            parameters.insert(key, value);
        }

        Ok(parameters)
    }
}

fn parse_parameter_object(content: &str) -> Result<Parameters> {
    match serde_json::from_str::<JsonValue>(content)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(anyhow!("expected a JSON object, found {}", kind(&other))),
    }
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Parse a single key=value pair
///
/// The value is read as a JSON scalar when possible and kept as a string otherwise.
fn parse_key_val(s: &str) -> Result<(String, JsonValue)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    let key = s[..pos].trim();
    if key.is_empty() {
        return Err(anyhow!("invalid KEY=value: empty key in `{}`", s));
    }

    let raw = &s[pos + 1..];
    let value = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(_) | JsonValue::Object(_)) | Err(_) => {
            JsonValue::String(raw.to_string())
        }
        Ok(scalar) => scalar,
    };

    Ok((key.to_string(), value))
}
