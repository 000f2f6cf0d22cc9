use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Raw text returned by a model, before any cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn text_only(text: impl Into<String>) -> Self {
        Completion {
            text: text.into(),
            usage: None,
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait AiProvider {
    /// Sends one prompt, no retry.
    async fn complete(&self, prompt: &str) -> Result<Completion>;
}
