use super::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::ApiKey;
use crate::error::{Service, UpstreamError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: ApiKey,
    pub base_url: String,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    text: Option<String>,
}

pub async fn chat(
    client: &Client,
    config: &ClaudeConfig,
    request: &ChatRequest,
) -> Result<ChatResponse, UpstreamError> {
    let body = ClaudeRequest {
        model: &request.model,
        max_tokens: MAX_TOKENS,
        messages: &request.messages,
    };

    let resp = client
        .post(format!("{}/v1/messages", config.base_url.trim_end_matches('/')))
        .header("Content-Type", "application/json")
        .header("x-api-key", config.api_key.expose())
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(UpstreamError::from_response(Service::Claude, resp).await);
    }

    let data: ClaudeResponse = resp
        .json()
        .await
        .map_err(|e| UpstreamError::Parse(format!("Claude response: {}", e)))?;
    let content = data
        .content
        .into_iter()
        .find_map(|c| c.text)
        .ok_or_else(|| UpstreamError::Parse("Claude response has no text content".into()))?;

    Ok(ChatResponse { content })
}
