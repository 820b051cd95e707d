//! CLI glue for readwise-digest: argument parsing, client construction and
//! orchestration. All pipeline logic lives in the library modules; this
//! module only wires configuration into them and reports the outcome.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::config::DigestConfig;
use crate::pipeline;
use crate::publish::GitHubRepo;
use crate::readwise::ReadwiseClient;
use crate::retry::RetryPolicy;

/// CLI for readwise-digest: publish a weekly reading digest to a blog
/// repository.
#[derive(Parser)]
#[clap(
    name = "readwise-digest",
    version,
    about = "Fetch a week of Readwise reading activity and commit a markdown digest"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate and publish the digest for the trailing week
    Generate {
        /// Anchor the window to this instant instead of now
        /// (RFC 3339, e.g. 2024-01-08T00:00:00Z)
        #[clap(long)]
        end: Option<String>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate { end } => {
            let anchor = match end {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| anyhow::anyhow!("invalid --end value {raw:?}: {e}"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };

            let config = DigestConfig::from_env()?;
            let retry = RetryPolicy::default();
            let source = ReadwiseClient::new(config.credential_readwise.clone(), retry)?;
            let store = GitHubRepo::new(&config, retry)?;

            tracing::info!(anchor = %anchor, "starting digest generation");
            match pipeline::run(&source, &store, &config.target_branch, anchor).await {
                Ok(report) => {
                    tracing::info!(
                        path = %report.path,
                        documents = report.document_count,
                        highlights = report.highlight_count,
                        commit = ?report.commit,
                        "digest published"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(stage = %e.stage, error = %e.cause, "digest run failed");
                    Err(e.into())
                }
            }
        }
    }
}
