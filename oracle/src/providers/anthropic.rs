use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;

use super::core::{AiProvider, Completion, TokenUsage};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const MAX_TOKENS: u32 = 16000;
pub const TEMPERATURE: f64 = 0.5;

const CONNECTION_CHECK_PROMPT: &str = "请回复\"连接成功\"";
const CONNECTION_CHECK_MAX_TOKENS: u32 = 100;

#[derive(Deserialize, Debug, Serialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Serialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        TokenUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }
}

pub struct AnthropicProvider {
    pub client: Arc<Client>,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl AnthropicProvider {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        AnthropicProvider {
            client: Arc::new(Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Reads `ANTHROPIC_BASE_URL`, `ANTHROPIC_AUTH_TOKEN` and `ANTHROPIC_MODEL`,
    /// loading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let api_key = env::var("ANTHROPIC_AUTH_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow!("Missing ANTHROPIC_AUTH_TOKEN environment variable"))?;
        let base_url = env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        info!("Anthropic provider: {} ({})", base_url, model);
        Ok(AnthropicProvider::new(&base_url, &api_key, &model))
    }

    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    async fn post_messages(&self, body: &Value) -> Result<MessagesResponse> {
        let url = self.messages_url();
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("x-api-key", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        info!("Anthropic response status: {}", status);
        let raw_text_response = response.text().await?;

        if !status.is_success() {
            bail!(
                "Anthropic API request failed: {} {}",
                status,
                error_details(&raw_text_response)
            );
        }

        serde_json::from_str(&raw_text_response)
            .map_err(|e| anyhow!("Failed to deserialize Anthropic response: {}", e))
    }

    /// Sends a tiny prompt and returns the reply, to verify credentials and base URL.
    pub async fn check_connection(&self) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": CONNECTION_CHECK_MAX_TOKENS,
            "messages": [{"role": "user", "content": CONNECTION_CHECK_PROMPT}],
        });
        let response = self.post_messages(&body).await?;
        extract_text(&response)
    }
}

pub fn request_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
        "messages": [{"role": "user", "content": prompt}],
    })
}

/// Text of the first `text` content block, trimmed.
pub fn extract_text(response: &MessagesResponse) -> Result<String> {
    response
        .content
        .iter()
        .find(|block| block.block_type == "text")
        .and_then(|block| block.text.as_deref())
        .map(|text| text.trim().to_string())
        .ok_or_else(|| anyhow!("No text content in Anthropic response"))
}

/// `error.message` from an error body, or the body itself.
pub fn error_details(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

impl AiProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let body = request_body(&self.model, prompt);
        debug!("Request body: {} bytes", body.to_string().len());

        let response = self.post_messages(&body).await?;
        let text = extract_text(&response)?;
        let usage = response.usage.map(TokenUsage::from);
        if let Some(usage) = usage {
            info!(
                "Token usage: {} in, {} out",
                usage.input_tokens, usage.output_tokens
            );
        }
        Ok(Completion { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = request_body("claude-test", "你好");
        assert_eq!(body["model"], "claude-test");
        assert_eq!(body["max_tokens"], 16000);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "你好");
    }

    #[test]
    fn test_extract_first_text_block() {
        let raw = r#"{
            "content": [
                {"type": "thinking"},
                {"type": "text", "text": "  {\"a\": 1}\n"},
                {"type": "text", "text": "second"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 20}
        }"#;
        let response: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(extract_text(&response).unwrap(), "{\"a\": 1}");
        let usage: TokenUsage = response.usage.unwrap().into();
        assert_eq!(usage.output_tokens, 20);
    }

    #[test]
    fn test_missing_text_block() {
        let response: MessagesResponse =
            serde_json::from_str(r#"{"content": [{"type": "tool_use"}]}"#).unwrap();
        assert!(extract_text(&response).is_err());
    }

    #[test]
    fn test_error_details() {
        assert_eq!(
            error_details(r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#),
            "invalid x-api-key"
        );
        assert_eq!(error_details("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let provider = AnthropicProvider::new("https://proxy.example/", "k", DEFAULT_MODEL);
        assert_eq!(provider.messages_url(), "https://proxy.example/v1/messages");
    }
}
