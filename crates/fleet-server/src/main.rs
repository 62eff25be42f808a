//! Fleet-ops server entry point.

use std::process::ExitCode;

use clap::Parser;
use fleet_server::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fleet=info")),
        )
        .json()
        .init();

    let config = ServerConfig::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting fleet server");

    match fleet_server::serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fleet server failed");
            ExitCode::FAILURE
        }
    }
}
