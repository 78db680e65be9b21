use std::time::Duration;

use thiserror::Error;

use crate::storage::config::ServerConfig;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    BuildError(#[from] reqwest::Error),
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

pub(crate) fn timeout_of(config: &ServerConfig) -> Duration {
    Duration::from_secs(config.timeout_seconds.max(1))
}
