//! Command-line front-end for the pack registry.

mod cli;
mod commands;
mod error;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use figment::providers::Serialized;
use packdrop_config::Config;
use packdrop_registry::Registry;
use packdrop_storage::backend::LocalBackend;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    init_tracing(&config);
    tracing::debug!(directory = %config.registry.directory.display(), "Opening registry");

    let backend = LocalBackend::new("local", &config.registry.directory).or_raise(|| ErrorKind::Storage)?;
    let registry = Registry::load(Arc::new(backend)).await.or_raise(|| ErrorKind::Registry)?;
    commands::execute(&registry, cli.command).await
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut figment = packdrop_config::figment(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(directory) = &cli.directory {
        figment = figment.merge(Serialized::default("registry.directory", directory));
    }
    Config::from_figment(&figment).or_raise(|| ErrorKind::Config)
}

/// Logs go to stderr so command output on stdout stays pipeable. `RUST_LOG`
/// overrides the configured level.
fn init_tracing(config: &Config) {
    let level = LevelFilter::from_level(config.log.level.into());
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
