//! Boundary traits for the digest pipeline.
//!
//! Two collaborators sit behind traits: the upstream reading-activity source
//! and the repository the digest is committed to. Real clients live in
//! [`crate::readwise`] and [`crate::publish`]; tests use the generated
//! mockall mocks.
//!
//! The traits are annotated for `mockall` so consumers can generate
//! deterministic mocks for unit/integration tests.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::DigestError;
use crate::model::{Document, Highlight};
use crate::window::DateWindow;

/// A file as it exists in the target repository, with the opaque version
/// marker needed for a lost-update-safe overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub content: String,
    pub version: String,
}

/// Outcome of an upsert against the target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitResult {
    Created { commit_sha: String },
    Updated { commit_sha: String },
    /// The file already held exactly these bytes; nothing was written.
    Unchanged,
}

/// Upstream source of reading activity. Both calls follow pagination to the
/// end and return fully materialized, window-verified sequences.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// All documents archived within the window.
    async fn fetch_documents(&self, window: DateWindow) -> Result<Vec<Document>, DigestError>;

    /// All highlights created within the window.
    async fn fetch_highlights(&self, window: DateWindow) -> Result<Vec<Highlight>, DigestError>;
}

/// The repository collaborator: read and write one file on a branch. The
/// transport (GitHub contents API, a local checkout, a test double) is the
/// implementor's concern.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepoStore: Send + Sync {
    /// Fetch the file at `path` on `branch`, or `None` when it does not
    /// exist.
    async fn get_file(&self, path: &str, branch: &str)
        -> Result<Option<RepoFile>, DigestError>;

    /// Create or overwrite the file. When `expected_version` is given and no
    /// longer matches the branch head's version of the file, the store must
    /// fail with [`DigestError::Conflict`] rather than overwrite.
    async fn put_file(
        &self,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
        expected_version: Option<String>,
    ) -> Result<CommitResult, DigestError>;
}
