//! Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use chainviz_explain::{ApiKeyCheck, ExplanationProvider, ProviderError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted outcome of one mock completion
pub enum MockReply {
    Text(String),
    Network,
    Api(u16),
}

/// Provider that returns a scripted reply and counts calls
pub struct MockProvider {
    reply: MockReply,
    credentials: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockReply::Text(text.into()))
    }

    pub fn failing() -> Self {
        Self::new(MockReply::Network)
    }

    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            credentials: true,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExplanationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Network => Err(ProviderError::InvalidResponse(
                "connection reset by peer".to_string(),
            )),
            MockReply::Api(status) => Err(ProviderError::Api {
                provider: "mock".to_string(),
                status: *status,
                body: "upstream error".to_string(),
            }),
        }
    }

    async fn test_api_key(&self) -> ApiKeyCheck {
        if self.credentials {
            ApiKeyCheck::ok("mock key accepted")
        } else {
            ApiKeyCheck::failed("mock has no key")
        }
    }
}
