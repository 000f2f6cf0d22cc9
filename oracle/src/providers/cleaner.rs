use anyhow::{anyhow, Result};
use regex::Regex;
use serde::de::DeserializeOwned;

/// Strips every markdown fence (```json and ```) and the whitespace after it.
pub fn clean_markdown(text: &str) -> Result<String> {
    let json_fence = Regex::new(r"```json\s*")?;
    let fence = Regex::new(r"```\s*")?;
    let text = json_fence.replace_all(text, "");
    Ok(fence.replace_all(&text, "").trim().to_string())
}

pub fn try_parse_json_with_trailing_comma_removal<T: DeserializeOwned>(
    json_string: &str,
) -> Result<T> {
    match serde_json::from_str(json_string) {
        Ok(parsed) => Ok(parsed),
        Err(original_error) => {
            let cleaned_json_string = fix_trailing_commas(json_string)?;
            serde_json::from_str(&cleaned_json_string).map_err(|e| {
                anyhow!(
                    "Failed to parse cleaned JSON: {}. Original error: {}",
                    e,
                    original_error
                )
            })
        }
    }
}

/// Clean fences, then parse model output.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    try_parse_json_with_trailing_comma_removal(&clean_markdown(text)?)
}

fn fix_trailing_commas(json_str: &str) -> Result<String> {
    // Replace ",]" or ",}" (with optional whitespace) with just "]" or "}"
    let re = Regex::new(r#",(\s*[\]}])"#)?;
    Ok(re.replace_all(json_str, "$1").to_string())
}
