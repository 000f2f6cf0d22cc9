use almanac::{compute_four_pillars, Calendar};
use anyhow::{anyhow, Result};
use common::{BirthInstant, BirthRequest, LifeDestinyResult, SchemaVersion};
use log::{debug, info};

use super::import::import_result;
use crate::providers::core::{AiProvider, TokenUsage};
use crate::providers::prompter::{build_prompt_for_chart, prompt_hash};

#[derive(Debug, Clone)]
pub struct GeneratedDestiny {
    pub result: LifeDestinyResult,
    pub usage: Option<TokenUsage>,
    pub prompt_hash: String,
}

/// Sends a prebuilt prompt and turns the reply into a validated result.
pub async fn generate_from_prompt<P: AiProvider>(
    provider: &P,
    prompt: &str,
    schema: SchemaVersion,
) -> Result<GeneratedDestiny> {
    let hash = prompt_hash(prompt);
    info!("Requesting destiny chart, prompt {} ({} chars)", hash, prompt.chars().count());

    let completion = provider.complete(prompt).await?;
    debug!("Model returned {} chars", completion.text.chars().count());

    let result = import_result(&completion.text, schema).map_err(|e| anyhow!("{}", e))?;
    info!("Destiny chart accepted: {} points", result.chart_data.len());

    Ok(GeneratedDestiny {
        result,
        usage: completion.usage,
        prompt_hash: hash,
    })
}

/// Full generation from birth data: pillars, prompt, one model call, validation.
pub async fn generate_destiny<P: AiProvider, C: Calendar + ?Sized>(
    provider: &P,
    calendar: &C,
    request: &BirthRequest,
    schema: SchemaVersion,
) -> Result<GeneratedDestiny> {
    let birth = BirthInstant::try_from(request)?;
    let chart = compute_four_pillars(calendar, &birth)?;
    let prompt = build_prompt_for_chart(&chart, birth.gender, request.year, schema);
    generate_from_prompt(provider, &prompt, schema).await
}
