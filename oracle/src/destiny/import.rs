use common::{LifeDestinyResult, SchemaVersion};
use log::debug;
use serde_json::Value;
use thiserror::Error;

use super::normalize::normalize;
use super::validate::{validate_into, ValidationError};
use crate::providers::cleaner::parse_model_json;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Parse(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Canonical result from pasted or model-produced JSON text.
///
/// Markdown fences are stripped and trailing commas tolerated before the
/// payload goes through the normalizer and the validator.
pub fn import_result(text: &str, schema: SchemaVersion) -> Result<LifeDestinyResult, ImportError> {
    let raw: Value = parse_model_json(text).map_err(|e| ImportError::Parse(e.to_string()))?;
    let normalized = normalize(&raw);
    debug!(
        "Normalized {} chart points",
        normalized["chartData"].as_array().map_or(0, Vec::len)
    );
    Ok(validate_into(normalized, schema)?)
}

pub fn export_result(result: &LifeDestinyResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}
