//! Readwise API client: authenticated, paginated, rate-limited retrieval of
//! archived documents (Reader API) and highlights (main API).
//!
//! Both endpoints are cursor-paginated; the client follows the cursor chain
//! to the end and returns a fully materialized sequence, since downstream
//! aggregation needs random access and sorting. Upstream filters by "updated
//! in range", which is not the same as "archived in range", so window
//! membership is re-verified after decoding.

use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::Deserialize;
use tracing::{debug, info};

use crate::contract::ReadingSource;
use crate::error::DigestError;
use crate::model::{Document, Highlight, Location};
use crate::retry::{send_with_retry, RetryPolicy};
use crate::window::{self, DateWindow};

pub const DEFAULT_READER_BASE_URL: &str = "https://readwise.io/api/v3";
pub const DEFAULT_HIGHLIGHTS_BASE_URL: &str = "https://readwise.io/api/v2";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const HIGHLIGHT_PAGE_SIZE: u32 = 1000;

pub struct ReadwiseClient {
    http: reqwest::Client,
    reader_base_url: String,
    highlights_base_url: String,
    token: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct DocumentPage {
    #[serde(default)]
    results: Vec<Document>,
    #[serde(rename = "nextPageCursor", default)]
    next_page_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HighlightPage {
    #[serde(default)]
    results: Vec<Highlight>,
    /// Opaque cursor: the URL of the next page, absent on the last page.
    #[serde(default)]
    next: Option<String>,
}

impl ReadwiseClient {
    pub fn new(token: String, retry: RetryPolicy) -> Result<Self, DigestError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            reader_base_url: DEFAULT_READER_BASE_URL.to_string(),
            highlights_base_url: DEFAULT_HIGHLIGHTS_BASE_URL.to_string(),
            token,
            retry,
        })
    }

    /// Points the client at different endpoints; tests use this to target a
    /// local mock server.
    pub fn with_base_urls(
        mut self,
        reader: impl Into<String>,
        highlights: impl Into<String>,
    ) -> Self {
        self.reader_base_url = reader.into().trim_end_matches('/').to_string();
        self.highlights_base_url = highlights.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T>(&self, url: &str, query: &[(&str, String)]) -> Result<T, DigestError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = send_with_retry(&self.retry, || {
            self.http
                .get(url)
                .query(query)
                .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::UpstreamRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn documents_in_window(&self, window: DateWindow) -> Result<Vec<Document>, DigestError> {
        let url = format!("{}/list/", self.reader_base_url);
        let updated_after = window.start.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut all: Vec<Document> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0u32;
        loop {
            let mut query = vec![
                ("location", "archive".to_string()),
                ("updatedAfter", updated_after.clone()),
            ];
            if let Some(c) = &cursor {
                query.push(("pageCursor", c.clone()));
            }
            let page: DocumentPage = self.get_json(&url, &query).await?;
            pages += 1;
            debug!(page = pages, results = page.results.len(), "fetched document page");
            all.extend(page.results);
            match page.next_page_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        // Upstream matched on update time; keep only items actually archived
        // inside the window.
        let archived: Vec<Document> = all
            .into_iter()
            .filter(|doc| doc.location == Location::Archive)
            .collect();
        let kept = window::filter_documents(archived, &window);
        info!(documents = kept.len(), pages, "fetched archived documents");
        Ok(kept)
    }

    async fn highlights_in_window(
        &self,
        window: DateWindow,
    ) -> Result<Vec<Highlight>, DigestError> {
        let first_url = format!("{}/highlights/", self.highlights_base_url);
        let created_after = window.start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let first_query = vec![
            ("page_size", HIGHLIGHT_PAGE_SIZE.to_string()),
            ("highlighted_at__gt", created_after),
        ];

        let mut all: Vec<Highlight> = Vec::new();
        let mut pages = 0u32;
        let mut page: HighlightPage = self.get_json(&first_url, &first_query).await?;
        loop {
            pages += 1;
            debug!(page = pages, results = page.results.len(), "fetched highlight page");
            all.extend(page.results);
            match page.next.take() {
                Some(next_url) if !next_url.is_empty() => {
                    page = self.get_json(&next_url, &[]).await?;
                }
                _ => break,
            }
        }

        let kept = window::filter_highlights(all, &window);
        info!(highlights = kept.len(), pages, "fetched highlights");
        Ok(kept)
    }
}

#[async_trait]
impl ReadingSource for ReadwiseClient {
    async fn fetch_documents(&self, window: DateWindow) -> Result<Vec<Document>, DigestError> {
        self.documents_in_window(window).await
    }

    async fn fetch_highlights(&self, window: DateWindow) -> Result<Vec<Highlight>, DigestError> {
        self.highlights_in_window(window).await
    }
}
