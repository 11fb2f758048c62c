//! Step explanations for chain flow walkthroughs
//!
//! Explanations come from a static catalog or, when a credentialed provider
//! is configured, from an LLM whose loosely formatted output is recovered
//! into an [`ExplanationResponse`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod recovery;
pub mod resolver;

pub use catalog::{FlowCatalog, FlowDefinition};
pub use chainviz_types::ExplanationResponse;
pub use config::{ResolverOptions, DEFAULT_PROVIDER_TIMEOUT};
pub use error::{CatalogError, ExplainError, PromptError, ProviderError};
pub use prompt::PromptBuilder;
pub use provider::{
    ApiKeyCheck, ChatCompletionsProvider, ExplanationProvider, ProviderKind, ProviderRegistry,
    ProviderSettings,
};
pub use recovery::{recover_explanation, RecoveredExplanation, RecoveryStep};
pub use resolver::{
    generic_failure, not_available_explanation, ExplanationRequest, ExplanationResolver,
};
