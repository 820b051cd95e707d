//! Publisher adapter: idempotent upsert of the digest file into the blog
//! repository, plus the GitHub contents-API implementation of the
//! repository collaborator.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::config::DigestConfig;
use crate::contract::{CommitResult, RepoFile, RepoStore};
use crate::error::DigestError;
use crate::retry::{send_with_retry, RetryPolicy};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates the file if absent, updates it if its content changed, and does
/// nothing when the stored bytes already match. The update passes the
/// fetched version marker so a concurrent edit surfaces as a Conflict
/// instead of being overwritten.
pub async fn upsert_file<S: RepoStore>(
    store: &S,
    path: &str,
    branch: &str,
    content: &str,
    message: &str,
) -> Result<CommitResult, DigestError> {
    match store.get_file(path, branch).await? {
        Some(existing) if existing.content == content => {
            info!(path, "digest unchanged, skipping commit");
            Ok(CommitResult::Unchanged)
        }
        Some(existing) => {
            info!(path, "digest exists, updating");
            store
                .put_file(path, branch, content, message, Some(existing.version))
                .await
        }
        None => {
            info!(path, "digest absent, creating");
            store.put_file(path, branch, content, message, None).await
        }
    }
}

/// Repository collaborator backed by the GitHub contents API. The blob sha
/// is the version marker.
pub struct GitHubRepo {
    http: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    commit: CommitInfo,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

impl GitHubRepo {
    pub fn new(config: &DigestConfig, retry: RetryPolicy) -> Result<Self, DigestError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("readwise-digest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            owner: config.repo_owner.clone(),
            repo: config.repo_name.clone(),
            token: config.credential_repo.clone(),
            retry,
        })
    }

    /// Points the client at a different API root; tests use this to target
    /// a local mock server.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, self.owner, self.repo, path
        )
    }

    fn decode_content(raw: &str) -> Result<String, DigestError> {
        // The contents API base64-encodes with embedded newlines.
        let cleaned: String = raw.split_whitespace().collect();
        let bytes = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|e| DigestError::Decode(format!("invalid base64 file content: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| DigestError::Decode(format!("file content is not UTF-8: {e}")))
    }
}

#[async_trait]
impl RepoStore for GitHubRepo {
    async fn get_file(
        &self,
        path: &str,
        branch: &str,
    ) -> Result<Option<RepoFile>, DigestError> {
        let url = self.contents_url(path);
        let response = send_with_retry(&self.retry, || {
            self.http
                .get(&url)
                .query(&[("ref", branch)])
                .bearer_auth(&self.token)
                .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                .send()
        })
        .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }
        let contents: ContentsResponse = response.json().await?;
        Ok(Some(RepoFile {
            content: Self::decode_content(&contents.content)?,
            version: contents.sha,
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
        expected_version: Option<String>,
    ) -> Result<CommitResult, DigestError> {
        let url = self.contents_url(path);
        let body = PutContentsBody {
            message,
            content: BASE64.encode(content.as_bytes()),
            branch,
            sha: expected_version.as_deref(),
        };
        let response = send_with_retry(&self.retry, || {
            self.http
                .put(&url)
                .bearer_auth(&self.token)
                .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                .json(&body)
                .send()
        })
        .await?;

        let status = response.status();
        // A stale sha comes back as 409 (or 422 on older deployments); both
        // mean someone else edited the file since we read it.
        if status == reqwest::StatusCode::CONFLICT
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(DigestError::Conflict {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }

        let created = status == reqwest::StatusCode::CREATED;
        let put: PutContentsResponse = response.json().await?;
        info!(
            path,
            branch,
            commit = %put.commit.sha,
            created,
            "committed digest file"
        );
        if created {
            Ok(CommitResult::Created {
                commit_sha: put.commit.sha,
            })
        } else {
            Ok(CommitResult::Updated {
                commit_sha: put.commit.sha,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_with_embedded_newlines() {
        let encoded = BASE64.encode("---\ntitle: digest\n---\n");
        let wrapped = format!("{}\n{}", &encoded[..8], &encoded[8..]);
        assert_eq!(
            GitHubRepo::decode_content(&wrapped).unwrap(),
            "---\ntitle: digest\n---\n"
        );
    }

    #[test]
    fn rejects_non_base64_content() {
        assert!(matches!(
            GitHubRepo::decode_content("!!not base64!!"),
            Err(DigestError::Decode(_))
        ));
    }
}
