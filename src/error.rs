//! Error taxonomy for the digest pipeline.
//!
//! Fatal errors propagate to the orchestrator, which wraps them in a
//! [`PipelineError`] naming the stage that failed. An empty window is not an
//! error: a run with zero documents and highlights still publishes a digest.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    /// Missing or invalid settings. Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Upstream answered with a non-rate-limit 4xx. Fatal per call.
    #[error("upstream rejected request with status {status}: {body}")]
    UpstreamRejected { status: u16, body: String },

    /// The backoff retry budget for rate-limit responses ran out.
    #[error("rate limit retry budget exhausted after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// Timeouts and 5xx responses that persisted past the retry ceiling.
    #[error("transient network failure persisted after {attempts} attempts: {detail}")]
    TransientNetwork { attempts: u32, detail: String },

    /// Publish-time version mismatch. Not retried: a blind retry could
    /// overwrite an intervening legitimate edit.
    #[error("conflicting edit detected for {path}")]
    Conflict { path: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload that could not be decoded (unexpected JSON shape, bad
    /// base64, non-UTF-8 file content).
    #[error("failed to decode upstream payload: {0}")]
    Decode(String),
}

/// The pipeline stage an error surfaced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Aggregating,
    Rendering,
    Publishing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Aggregating => "aggregating",
            Stage::Rendering => "rendering",
            Stage::Publishing => "publishing",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a digest run: the stage that failed and why.
#[derive(Error, Debug)]
#[error("digest run failed during {stage}: {cause}")]
pub struct PipelineError {
    pub stage: Stage,
    pub cause: DigestError,
}

impl PipelineError {
    pub fn at(stage: Stage, cause: DigestError) -> Self {
        Self { stage, cause }
    }
}
