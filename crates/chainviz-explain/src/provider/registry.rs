//! Cached provider factory

use super::{ChatCompletionsProvider, ExplanationProvider, ProviderKind, ProviderSettings};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Hands out one shared provider instance per [`ProviderKind`]
#[derive(Debug)]
pub struct ProviderRegistry {
    settings: ProviderSettings,
    providers: RwLock<HashMap<ProviderKind, Arc<dyn ExplanationProvider>>>,
}

impl ProviderRegistry {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            providers: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Cached provider for `kind`, built from the settings on first use
    pub async fn get(&self, kind: ProviderKind) -> Arc<dyn ExplanationProvider> {
        if let Some(provider) = self.providers.read().await.get(&kind) {
            return Arc::clone(provider);
        }

        let mut providers = self.providers.write().await;
        let provider = providers.entry(kind).or_insert_with(|| {
            debug!(provider = %kind, "Creating explanation provider");
            Arc::new(ChatCompletionsProvider::from_settings(kind, &self.settings))
        });
        Arc::clone(provider)
    }

    /// Replace the cached provider for `kind`
    pub async fn register(&self, kind: ProviderKind, provider: Arc<dyn ExplanationProvider>) {
        self.providers.write().await.insert(kind, provider);
    }

    pub async fn has_credentials(&self, kind: ProviderKind) -> bool {
        self.get(kind).await.has_credentials()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_cached_instance() {
        let registry =
            ProviderRegistry::new(ProviderSettings::new().with_api_key(ProviderKind::Groq, "k"));

        let first = registry.get(ProviderKind::Groq).await;
        let second = registry.get(ProviderKind::Groq).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.has_credentials(ProviderKind::Groq).await);
        assert!(!registry.has_credentials(ProviderKind::OpenAi).await);
    }
}
