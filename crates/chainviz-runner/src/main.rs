use anyhow::{Context, Result};
use chainviz_runner::Cli;
use clap::Parser;
use tracing::subscriber;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chainviz=debug"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    subscriber::set_global_default(subscriber)
        .context("Failed to set global default tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    cli.command.run().await
}
