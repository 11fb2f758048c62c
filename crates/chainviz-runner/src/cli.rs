//! Command-line surface
//!
//! Only the commands that talk to a provider read the provider
//! configuration, so `simulate` works with a broken or missing `.env`.

use crate::config::RunnerConfig;
use crate::simulate::{run_simulation, SimulationOptions};
use anyhow::{bail, Context, Result};
use chainviz_explain::{
    ExplanationRequest, ExplanationResolver, ExplanationResponse, FlowCatalog, ProviderRegistry,
};
use chainviz_flow::{ActionKind, ActionParams};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Simulate blockchain actions and fetch step explanations.
#[derive(Parser, Debug)]
#[command(name = "chainviz-runner", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one action through processing, confirmations and completion
    Simulate {
        /// Action kind, e.g. deposit or swap
        #[arg(long)]
        action: ActionKind,
        /// Confirmations required to complete
        #[arg(long)]
        confirmations: Option<u32>,
        /// Milliseconds between confirmations
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Milliseconds of simulated processing delay
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Amount recorded in the action parameters
        #[arg(long)]
        amount: Option<String>,
    },
    /// Print the explanation for one step as JSON
    Explain {
        /// Flow key, e.g. bridge or multisig-mint
        #[arg(long)]
        flow: String,
        /// Step number, 0 for the overview
        #[arg(long)]
        step: u32,
        /// Only use the static table
        #[arg(long = "static")]
        static_only: bool,
        /// Extra learner context for the overview prompt
        #[arg(long)]
        context: Option<String>,
        /// Alternative catalog YAML file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Verify the configured provider's API key
    CheckProvider,
}

impl Command {
    /// Execute the command, printing its result to stdout
    pub async fn run(self) -> Result<()> {
        match self {
            Command::Simulate {
                action,
                confirmations,
                interval_ms,
                delay_ms,
                amount,
            } => {
                let options = SimulationOptions {
                    confirmations,
                    interval: interval_ms.map(Duration::from_millis),
                    delay: delay_ms.map(Duration::from_millis),
                };
                let mut params = ActionParams::new();
                if let Some(amount) = amount {
                    params = params.with_amount(amount);
                }

                let report = run_simulation(action, params, &options).await?;
                let final_state = report
                    .final_state()
                    .context("Simulation produced no states")?;
                println!(
                    "{action} {} after {} confirmation(s), reference {}",
                    final_state.status, final_state.confirmations, report.reference_id
                );
            }
            Command::Explain {
                flow,
                step,
                static_only,
                context,
                catalog,
            } => {
                let config = RunnerConfig::load()?;
                let mut request = ExplanationRequest::new(flow, step);
                request.prefer_static = static_only;
                request.context = context;

                let response = explain(&config, catalog, &request).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Command::CheckProvider => {
                let config = RunnerConfig::load()?;
                let registry = ProviderRegistry::new(config.settings.clone());
                let provider = registry.get(config.provider).await;
                info!(provider = provider.name(), "Checking API key");

                let check = provider.test_api_key().await;
                println!("{}", check.message);
                if !check.success {
                    bail!("{} API key check failed", config.provider);
                }
            }
        }

        Ok(())
    }
}

/// Resolve one explanation with the configured provider
pub async fn explain(
    config: &RunnerConfig,
    catalog: Option<PathBuf>,
    request: &ExplanationRequest,
) -> Result<ExplanationResponse> {
    let catalog = match catalog {
        Some(path) => FlowCatalog::from_path(&path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => FlowCatalog::builtin().context("Built-in catalog is invalid")?,
    };
    if catalog.flow(&request.flow_type).is_none() {
        warn!(flow = %request.flow_type, "Flow is not in the catalog");
    }

    let registry = ProviderRegistry::new(config.settings.clone());
    let resolver = ExplanationResolver::from_registry(
        Arc::new(catalog),
        config.resolver,
        &registry,
        config.provider,
    )
    .await
    .context("Failed to prepare prompt templates")?;

    Ok(resolver.get_explanation(request).await)
}
