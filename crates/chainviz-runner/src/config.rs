//! Environment-driven runner configuration

use anyhow::{anyhow, Result};
use chainviz_explain::{ProviderKind, ProviderSettings, ResolverOptions};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;

pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::OpenAi;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything the runner reads from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Provider used for live explanations
    pub provider: ProviderKind,
    pub settings: ProviderSettings,
    pub resolver: ResolverOptions,
}

impl RunnerConfig {
    /// Build from environment variables only
    pub fn from_env() -> Result<Self> {
        let tag = get_env_string("CHAINVIZ_PROVIDER", &DEFAULT_PROVIDER.to_string());
        let provider = ProviderKind::from_str(tag.trim())
            .map_err(|_| anyhow!("Unknown CHAINVIZ_PROVIDER '{tag}'"))?;

        let mut settings = ProviderSettings::new();
        for kind in ProviderKind::iter() {
            if let Ok(key) = env::var(kind.api_key_var()) {
                settings = settings.with_api_key(kind, key);
            }
        }
        if let Some(model) = env::var("CHAINVIZ_MODEL").ok().filter(|m| !m.trim().is_empty()) {
            settings = settings.with_model(model);
        }

        let resolver = ResolverOptions::default()
            .with_force_static(get_env_bool("CHAINVIZ_FORCE_STATIC"))
            .with_development(get_env_string("CHAINVIZ_ENV", "production") == "development")
            .with_provider_timeout(Duration::from_secs(get_env_var(
                "CHAINVIZ_PROVIDER_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )));

        Ok(Self {
            provider,
            settings,
            resolver,
        })
    }

    /// Load `.env` if present, then read the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }
}

/// Environment variable parsed as `T`, or `default`
pub fn get_env_var<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub fn get_env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `1`, `true` and `yes` (any case) are true; everything else is false
pub fn get_env_bool(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
