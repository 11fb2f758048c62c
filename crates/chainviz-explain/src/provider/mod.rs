//! Explanation providers
//!
//! A provider turns a prompt into raw model text. Everything after that
//! (recovery, fallbacks, timeouts) is handled by the resolver, so an
//! implementation only has to talk to its API.

mod chat;
mod registry;

pub use chat::ChatCompletionsProvider;
pub use registry::ProviderRegistry;

use crate::error::ProviderError;
use crate::recovery::recover_explanation;
use async_trait::async_trait;
use chainviz_types::ExplanationResponse;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};

/// Outcome of an API key check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyCheck {
    pub success: bool,
    pub message: String,
}

impl ApiKeyCheck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Source of live explanations
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether a call could succeed at all
    fn has_credentials(&self) -> bool;

    /// Raw completion text for `prompt`
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Cheap authenticated request that verifies the configured key
    async fn test_api_key(&self) -> ApiKeyCheck;

    /// Complete `prompt` and recover a structured explanation from the output
    async fn call_llm(&self, prompt: &str) -> Result<ExplanationResponse, ProviderError> {
        let raw = self.complete(prompt).await?;
        if raw.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(recover_explanation(&raw).response)
    }
}

impl std::fmt::Debug for dyn ExplanationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationProvider")
            .field("name", &self.name())
            .field("has_credentials", &self.has_credentials())
            .finish()
    }
}

/// Supported OpenAI-compatible backends
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Groq,
    OpenRouter,
    Zai,
}

impl ProviderKind {
    pub fn base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Zai => "https://api.z.ai/api/coding/paas/v4",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Groq => "llama-3.3-70b-versatile",
            ProviderKind::OpenRouter => "openai/gpt-4o-mini",
            ProviderKind::Zai => "glm-4.6",
        }
    }

    /// Environment variable the runner reads the key from
    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::Zai => "ZAI_API_KEY",
        }
    }
}

/// Plain configuration values for building providers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_keys: HashMap<ProviderKind, String>,
    /// Overrides the default model of every provider
    pub model: Option<String>,
    /// Overrides the base URL of every provider
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        self.api_keys.insert(kind, key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Non-blank key for `kind`
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        self.api_keys
            .get(&kind)
            .map(String::as_str)
            .filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_provider_kind_tags() {
        assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
        assert_eq!(ProviderKind::OpenRouter.to_string(), "openrouter");
        assert_eq!(ProviderKind::from_str("ZAI").unwrap(), ProviderKind::Zai);
        assert!(ProviderKind::from_str("anthropic").is_err());
    }

    #[test]
    fn test_blank_keys_are_ignored() {
        let settings = ProviderSettings::new()
            .with_api_key(ProviderKind::Groq, "  ")
            .with_api_key(ProviderKind::Zai, "zai-key");
        assert_eq!(settings.api_key(ProviderKind::Groq), None);
        assert_eq!(settings.api_key(ProviderKind::Zai), Some("zai-key"));
        assert_eq!(settings.api_key(ProviderKind::OpenAi), None);
    }
}
