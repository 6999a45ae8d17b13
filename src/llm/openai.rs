use super::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::ApiKey;
use crate::error::{Service, UpstreamError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: ApiKey,
    pub base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

pub async fn chat(
    client: &Client,
    config: &OpenAiConfig,
    request: &ChatRequest,
) -> Result<ChatResponse, UpstreamError> {
    let body = OpenAiRequest {
        model: &request.model,
        messages: &request.messages,
    };

    let resp = client
        .post(format!("{}/chat/completions", config.base_url.trim_end_matches('/')))
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", config.api_key.expose()))
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(UpstreamError::from_response(Service::OpenAi, resp).await);
    }

    let data: OpenAiResponse = resp
        .json()
        .await
        .map_err(|e| UpstreamError::Parse(format!("OpenAI response: {}", e)))?;
    let content = data
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| UpstreamError::Parse("OpenAI response has no message content".into()))?;

    Ok(ChatResponse { content })
}
