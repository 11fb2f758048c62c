use thiserror::Error;

/// Errors raised while loading a flow catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Two flows share a key
    #[error("Duplicate flow '{0}' in catalog")]
    DuplicateFlow(String),

    /// Steps must be numbered 1..=n in order
    #[error("Flow '{flow}' has step {found} where step {expected} was expected")]
    InvalidStep {
        flow: String,
        expected: u32,
        found: u32,
    },
}

/// Errors raised while rendering provider prompts
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Flow '{0}' is not in the catalog")]
    UnknownFlow(String),

    #[error("Flow '{flow}' has no step {step}")]
    UnknownStep { flow: String, step: u32 },
}

/// Errors raised by explanation providers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No API key configured for {0}")]
    MissingCredentials(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Provider call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Why a live explanation could not be produced
///
/// The resolver absorbs these and falls back to static content.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
