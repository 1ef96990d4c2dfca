//! Binary crate for the `weather-proxy` service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Serving the HTTP API (routing, CORS, error mapping)
//! - Interactive configuration and one-shot lookups

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
