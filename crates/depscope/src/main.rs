//! Depscope CLI binary.

use anyhow::Result;
use depscope::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the depscope CLI.
///
/// Uses tokio's `current_thread` runtime; the engine serializes its own
/// mutations and the CLI applies steps one at a time.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=depscope=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("depscope=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting depscope CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Depscope CLI completed successfully");
    Ok(())
}
