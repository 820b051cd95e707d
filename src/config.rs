//! Environment-provided configuration.
//!
//! The pipeline owns none of its settings: credentials and repository
//! identity arrive through the environment and are validated here, before
//! any network call. All missing names are collected into one error so a
//! misconfigured deployment is fixed in one round trip.

use std::env;

use tracing::info;

use crate::error::DigestError;

pub const ENV_REPO_OWNER: &str = "REPO_OWNER";
pub const ENV_REPO_NAME: &str = "REPO_NAME";
pub const ENV_TARGET_BRANCH: &str = "TARGET_BRANCH";
pub const ENV_CREDENTIAL_READWISE: &str = "CREDENTIAL_READWISE";
pub const ENV_CREDENTIAL_REPO: &str = "CREDENTIAL_REPO";

/// Everything a digest run needs from its environment. Passed explicitly
/// into the clients so tests can supply fakes.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub repo_owner: String,
    pub repo_name: String,
    pub target_branch: String,
    pub credential_readwise: String,
    pub credential_repo: String,
}

impl DigestConfig {
    /// Reads all required settings, treating blank values as absent.
    pub fn from_env() -> Result<Self, DigestError> {
        let mut missing: Vec<&'static str> = Vec::new();
        let mut require = |name: &'static str| match env::var(name) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let config = Self {
            repo_owner: require(ENV_REPO_OWNER),
            repo_name: require(ENV_REPO_NAME),
            target_branch: require(ENV_TARGET_BRANCH),
            credential_readwise: require(ENV_CREDENTIAL_READWISE),
            credential_repo: require(ENV_CREDENTIAL_REPO),
        };

        if !missing.is_empty() {
            return Err(DigestError::Configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        info!(
            repo_owner = %config.repo_owner,
            repo_name = %config.repo_name,
            target_branch = %config.target_branch,
            readwise_credential_set = !config.credential_readwise.is_empty(),
            repo_credential_set = !config.credential_repo.is_empty(),
            "loaded configuration from environment"
        );
        Ok(config)
    }
}
