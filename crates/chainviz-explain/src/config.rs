use std::time::Duration;

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolver behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Never call a provider, even with credentials
    pub force_static: bool,
    /// Emit recovery diagnostics
    pub development: bool,
    /// Upper bound on one provider call
    pub provider_timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            force_static: false,
            development: false,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl ResolverOptions {
    pub fn with_force_static(mut self, force_static: bool) -> Self {
        self.force_static = force_static;
        self
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }
}
