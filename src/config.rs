use std::fmt;

use crate::poller::PollPolicy;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LOG_FILTER: &str = "docupipe_inspector=info,docupipe_inspector_lib=info";

/// Raw startup settings, each with an environment-variable fallback.
///
/// Only `main` parses these; everything else receives a validated [`Config`].
#[derive(Clone, Default, clap::Args)]
pub struct Settings {
    /// DocuPipe API key
    #[arg(long, env = "DOCUPIPE_API_KEY", hide_env_values = true)]
    pub docupipe_api_key: Option<String>,

    /// Text-generation API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Schema the standardization step maps documents onto
    #[arg(long, env = "DOCUPIPE_SCHEMA_ID")]
    pub schema_id: Option<String>,

    /// DocuPipe base URL, e.g. https://app.docupipe.ai
    #[arg(long, env = "DOCUPIPE_BASE_URL")]
    pub base_url: Option<String>,

    /// Model id; prefix with "claude/" for Anthropic models
    #[arg(long, env = "INSPECTOR_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Override the text-generation base URL
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// An API key that never prints in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Mask for display: first and last four characters only.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        } else {
            "****".to_string()
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.masked()).finish()
    }
}

#[derive(Debug, Clone)]
pub struct DocuPipeConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub schema_id: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: ApiKey,
    /// Model string as configured, provider prefix included.
    pub model: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub docupipe: DocuPipeConfig,
    pub llm: LlmConfig,
    pub poll: PollPolicy,
}

impl Config {
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let docupipe_api_key = required("DOCUPIPE_API_KEY", settings.docupipe_api_key)?;
        let llm_api_key = required("OPENAI_API_KEY", settings.llm_api_key)?;
        let schema_id = required("DOCUPIPE_SCHEMA_ID", settings.schema_id)?;
        let base_url = parse_base_url(
            "DOCUPIPE_BASE_URL",
            required("DOCUPIPE_BASE_URL", settings.base_url)?,
        )?;
        let model = required("INSPECTOR_MODEL", Some(settings.model))?;
        let llm_base_url = match settings.llm_base_url.filter(|v| !v.trim().is_empty()) {
            Some(url) => Some(parse_base_url("LLM_BASE_URL", url)?),
            None => None,
        };

        Ok(Config {
            docupipe: DocuPipeConfig {
                api_key: ApiKey::new(docupipe_api_key),
                base_url,
                schema_id,
            },
            llm: LlmConfig {
                api_key: ApiKey::new(llm_api_key),
                model,
                base_url: llm_base_url,
            },
            poll: PollPolicy::default(),
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_base_url(name: &'static str, url: String) -> Result<String, ConfigError> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("expected an http(s) URL, got {:?}", url),
        });
    }
    Ok(url.trim_end_matches('/').to_string())
}
