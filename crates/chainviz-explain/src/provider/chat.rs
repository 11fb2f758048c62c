//! OpenAI-compatible `chat/completions` client

use super::{ApiKeyCheck, ExplanationProvider, ProviderKind, ProviderSettings};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const SYSTEM_PROMPT: &str = "You explain blockchain transaction flows to learners. \
Always answer with a single JSON object and no surrounding text.";

/// Client for any backend speaking the OpenAI chat completions API
#[derive(Clone)]
pub struct ChatCompletionsProvider {
    kind: ProviderKind,
    base_url: String,
    model: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for ChatCompletionsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsProvider")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl ChatCompletionsProvider {
    pub fn new(kind: ProviderKind, api_key: Option<String>) -> Self {
        Self {
            kind,
            base_url: kind.base_url().to_string(),
            model: kind.default_model().to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            http_client: reqwest::Client::new(),
        }
    }

    /// Build from settings, applying model and base URL overrides
    pub fn from_settings(kind: ProviderKind, settings: &ProviderSettings) -> Self {
        let mut provider = Self::new(kind, settings.api_key(kind).map(str::to_string));
        if let Some(model) = &settings.model {
            provider = provider.with_model(model.clone());
        }
        if let Some(base_url) = &settings.base_url {
            provider = provider.with_base_url(base_url.clone());
        }
        provider
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredentials(self.kind.to_string()))
    }

    async fn error_for(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        ProviderError::Api {
            provider: self.kind.to_string(),
            status,
            body,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    /// Reasoning models sometimes put the whole answer here
    #[serde(default)]
    reasoning_content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> Option<String> {
        let message = self.choices.into_iter().next()?.message;
        message
            .content
            .filter(|content| !content.trim().is_empty())
            .or(message.reasoning_content)
            .filter(|content| !content.trim().is_empty())
    }
}

#[async_trait]
impl ExplanationProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        match self.kind {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Zai => "zai",
        }
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip(self, prompt), fields(provider = %self.kind, model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
        };

        debug!(prompt_len = prompt.len(), "Sending chat completion request");
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = self.error_for(response).await;
            warn!(%error, "Chat completion request failed");
            return Err(error);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let text = body.into_text().ok_or(ProviderError::EmptyResponse)?;
        debug!(response_len = text.len(), "Received chat completion");
        Ok(text)
    }

    async fn test_api_key(&self) -> ApiKeyCheck {
        let api_key = match self.api_key() {
            Ok(key) => key,
            Err(e) => return ApiKeyCheck::failed(e.to_string()),
        };

        let url = format!("{}/models", self.base_url);
        match self.http_client.get(&url).bearer_auth(api_key).send().await {
            Ok(response) if response.status().is_success() => {
                ApiKeyCheck::ok(format!("{} API key is valid", self.kind))
            }
            Ok(response) => ApiKeyCheck::failed(self.error_for(response).await.to_string()),
            Err(e) => ApiKeyCheck::failed(format!("Could not reach {}: {e}", self.kind)),
        }
    }
}
