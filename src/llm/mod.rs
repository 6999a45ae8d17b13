pub mod claude;
pub mod openai;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::LlmConfig;
use crate::error::UpstreamError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
}

/// Single-turn text generation: one user prompt in, one answer out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete_chat(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// LLM backend: OpenAI-compatible or Claude.
#[derive(Debug, Clone)]
pub enum Provider {
    OpenAi(openai::OpenAiConfig),
    Claude(claude::ClaudeConfig),
}

impl Provider {
    /// Resolve a backend from a model string like "gpt-4o", "openai/gpt-4o" or
    /// "claude/claude-sonnet-4-20250514". Returns the provider and bare model id.
    pub fn resolve(config: &LlmConfig) -> (Self, String) {
        if let Some(model_id) = config.model.strip_prefix("claude/") {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| CLAUDE_BASE_URL.to_string());
            (
                Provider::Claude(claude::ClaudeConfig {
                    api_key: config.api_key.clone(),
                    base_url,
                }),
                model_id.to_string(),
            )
        } else {
            let model_id = config.model.strip_prefix("openai/").unwrap_or(&config.model);
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string());
            (
                Provider::OpenAi(openai::OpenAiConfig {
                    api_key: config.api_key.clone(),
                    base_url,
                }),
                model_id.to_string(),
            )
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi(_) => "openai",
            Provider::Claude(_) => "claude",
        }
    }
}

/// The configured text-generation service.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    provider: Provider,
    model: String,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        let (provider, model) = Provider::resolve(config);
        Self {
            http: Client::new(),
            provider,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, UpstreamError> {
        match &self.provider {
            Provider::OpenAi(config) => openai::chat(&self.http, config, request).await,
            Provider::Claude(config) => claude::chat(&self.http, config, request).await,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn complete_chat(&self, prompt: &str) -> Result<String, UpstreamError> {
        let request = ChatRequest {
            messages: vec![ChatMessage::user(prompt)],
            model: self.model.clone(),
        };
        tracing::debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "requesting completion"
        );
        let response = self.chat(&request).await?;
        Ok(response.content)
    }
}
