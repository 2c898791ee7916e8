//! Binary crate for the weather finder API.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading configuration
//! - Serving the HTTP API
//! - Operator commands that run the pipeline once

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod server;

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,weather_core=debug,weather_api=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cmd = cli::Cli::parse();
    cmd.run().await
}
