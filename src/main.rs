use anyhow::Result;
use clap::Parser;
use readwise_digest::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing for the CLI.
    tracing_subscriber::fmt::init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("digest generation completed"),
        Err(e) => tracing::error!(error = %e, "digest generation failed"),
    }
    result
}
