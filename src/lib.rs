//! readwise-digest: turns a week of Readwise reading activity into a
//! markdown digest committed to a blog repository.
//!
//! The pipeline fetches archived documents and highlights from the two
//! Readwise APIs, filters them to a seven-day window, aggregates statistics,
//! renders deterministic markdown and upserts the file through the GitHub
//! contents API. Each run is stateless and single-pass.

pub mod cli;
pub mod config;
pub mod contract;
pub mod digest;
pub mod error;
pub mod markdown;
pub mod model;
pub mod pipeline;
pub mod publish;
pub mod readwise;
pub mod retry;
pub mod window;

pub use cli::{run, Cli, Commands};
