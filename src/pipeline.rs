//! Single-pass orchestration: fetch, aggregate, render, publish.
//!
//! The run moves through its stages exactly once. Any failure maps to a
//! [`PipelineError`] naming the stage, and later stages never execute, so a
//! fetch failure can never reach publishing. Nothing has side effects until
//! the publish stage, so no rollback is needed.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::contract::{CommitResult, ReadingSource, RepoStore};
use crate::digest;
use crate::error::{PipelineError, Stage};
use crate::markdown;
use crate::publish;
use crate::window::DateWindow;

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct DigestReport {
    pub window: DateWindow,
    pub document_count: u64,
    pub highlight_count: u64,
    pub path: String,
    pub commit: CommitResult,
}

/// Repository path of the digest for a window, derived from its start date.
pub fn digest_path(window: &DateWindow) -> String {
    format!(
        "content/posts/{}-weekly-reading-digest.md",
        window.start.date_naive()
    )
}

pub fn commit_message(window: &DateWindow) -> String {
    format!("feat: add weekly reading digest {}", window.start.date_naive())
}

/// Runs the digest pipeline for the week trailing `anchor`.
///
/// An empty window is a normal run: it still publishes a minimal digest.
pub async fn run<S, R>(
    source: &S,
    store: &R,
    branch: &str,
    anchor: DateTime<Utc>,
) -> Result<DigestReport, PipelineError>
where
    S: ReadingSource,
    R: RepoStore,
{
    let window = DateWindow::trailing_week(anchor);
    info!(start = %window.start, end = %window.end, "starting digest run");

    let documents = source
        .fetch_documents(window)
        .await
        .map_err(|e| PipelineError::at(Stage::Fetching, e))?;
    let highlights = source
        .fetch_highlights(window)
        .await
        .map_err(|e| PipelineError::at(Stage::Fetching, e))?;
    info!(
        documents = documents.len(),
        highlights = highlights.len(),
        "fetch complete"
    );

    let summary = digest::aggregate(documents, highlights);
    info!(
        documents = summary.document_count,
        highlights = summary.highlight_count,
        total_words = summary.total_words,
        "aggregation complete"
    );

    let content = markdown::render(&summary, &window);

    let path = digest_path(&window);
    let message = commit_message(&window);
    let commit = publish::upsert_file(store, &path, branch, &content, &message)
        .await
        .map_err(|e| PipelineError::at(Stage::Publishing, e))?;
    info!(path = %path, commit = ?commit, "digest run complete");

    Ok(DigestReport {
        window,
        document_count: summary.document_count,
        highlight_count: summary.highlight_count,
        path,
        commit,
    })
}
