//! Explanation resolution: static table, live provider, fallbacks
//!
//! `get_explanation` never fails. Every error on the live path is logged and
//! replaced with static content or a fixed placeholder.

use crate::catalog::FlowCatalog;
use crate::config::ResolverOptions;
use crate::error::{ExplainError, PromptError, ProviderError};
use crate::prompt::PromptBuilder;
use crate::provider::{ExplanationProvider, ProviderKind, ProviderRegistry};
use crate::recovery::recover_explanation;
use chainviz_types::ExplanationResponse;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const NOT_AVAILABLE_SIMPLIFIED: &str =
    "A simplified explanation for this step will be added soon.";
pub const GENERIC_FAILURE_EXPLANATION: &str =
    "Sorry, an explanation for this step could not be generated right now.";
pub const GENERIC_FAILURE_SIMPLIFIED: &str = "Please try again in a moment.";

/// One explanation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationRequest {
    /// Catalog flow key, e.g. `bridge`
    pub flow_type: String,
    /// Step number, 0 = overview
    pub step: u32,
    pub prefer_static: bool,
    /// Free-form learner context, used by the overview prompt
    pub context: Option<String>,
}

impl ExplanationRequest {
    pub fn new(flow_type: impl Into<String>, step: u32) -> Self {
        Self {
            flow_type: flow_type.into(),
            step,
            prefer_static: false,
            context: None,
        }
    }

    pub fn prefer_static(mut self) -> Self {
        self.prefer_static = true;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Filler for a `(flow, step)` pair with no static entry
pub fn not_available_explanation(flow: &str, step: u32) -> ExplanationResponse {
    ExplanationResponse::new(format!(
        "AI explanation for {flow} step {step} is not available yet."
    ))
    .with_simplified(NOT_AVAILABLE_SIMPLIFIED)
}

/// Response used when the live path fails and no static entry exists
pub fn generic_failure() -> ExplanationResponse {
    ExplanationResponse::new(GENERIC_FAILURE_EXPLANATION)
        .with_simplified(GENERIC_FAILURE_SIMPLIFIED)
}

/// Resolves explanations from the catalog and an optional live provider
#[derive(Debug, Clone)]
pub struct ExplanationResolver {
    catalog: Arc<FlowCatalog>,
    prompts: Arc<PromptBuilder>,
    provider: Option<Arc<dyn ExplanationProvider>>,
    options: ResolverOptions,
}

impl ExplanationResolver {
    /// Static-only resolver
    pub fn new(catalog: Arc<FlowCatalog>, options: ResolverOptions) -> Result<Self, PromptError> {
        Ok(Self {
            catalog,
            prompts: Arc::new(PromptBuilder::new()?),
            provider: None,
            options,
        })
    }

    pub fn with_provider(mut self, provider: Arc<dyn ExplanationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolver backed by the registry's provider for `kind`
    pub async fn from_registry(
        catalog: Arc<FlowCatalog>,
        options: ResolverOptions,
        registry: &ProviderRegistry,
        kind: ProviderKind,
    ) -> Result<Self, PromptError> {
        let provider = registry.get(kind).await;
        Ok(Self::new(catalog, options)?.with_provider(provider))
    }

    pub fn catalog(&self) -> &FlowCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Explanation for `request`; always resolves
    #[instrument(skip(self, request), fields(flow = %request.flow_type, step = request.step))]
    pub async fn get_explanation(&self, request: &ExplanationRequest) -> ExplanationResponse {
        let Some(provider) = self.live_provider(request) else {
            debug!("Serving static explanation");
            return self.static_or_placeholder(request);
        };

        match self.live_explanation(&**provider, request).await {
            Ok(response) => response,
            Err(ExplainError::Prompt(error)) => {
                warn!(%error, "Could not build explanation prompt");
                self.static_or_placeholder(request)
            }
            Err(ExplainError::Provider(error)) => {
                warn!(provider = provider.name(), %error, "Live explanation failed");
                match self.catalog.static_explanation(&request.flow_type, request.step) {
                    Some(entry) => {
                        info!("Falling back to static explanation");
                        entry.clone()
                    }
                    None => generic_failure(),
                }
            }
        }
    }

    fn live_provider(
        &self,
        request: &ExplanationRequest,
    ) -> Option<&Arc<dyn ExplanationProvider>> {
        if request.prefer_static || self.options.force_static {
            return None;
        }
        self.provider
            .as_ref()
            .filter(|provider| provider.has_credentials())
    }

    fn static_or_placeholder(&self, request: &ExplanationRequest) -> ExplanationResponse {
        self.catalog
            .static_explanation(&request.flow_type, request.step)
            .cloned()
            .unwrap_or_else(|| not_available_explanation(&request.flow_type, request.step))
    }

    async fn live_explanation(
        &self,
        provider: &dyn ExplanationProvider,
        request: &ExplanationRequest,
    ) -> Result<ExplanationResponse, ExplainError> {
        let flow = self
            .catalog
            .flow(&request.flow_type)
            .ok_or_else(|| PromptError::UnknownFlow(request.flow_type.clone()))?;
        let prompt = self
            .prompts
            .build(flow, request.step, request.context.as_deref())?;

        let timeout = self.options.provider_timeout;
        let raw = tokio::time::timeout(timeout, provider.complete(&prompt))
            .await
            .map_err(|_| ProviderError::Timeout(timeout))??;
        if raw.trim().is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }

        let recovered = recover_explanation(&raw);
        if self.options.development {
            debug!(
                strategy = %recovered.step,
                raw_len = raw.len(),
                "Recovered live explanation"
            );
        }
        Ok(recovered.response)
    }
}
