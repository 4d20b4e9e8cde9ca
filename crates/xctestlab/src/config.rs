use crate::error::{Error, Result};
use std::env;

pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;

#[derive(Debug, Clone)]
pub struct TestLabConfig {
    pub gcp_project: String,
    /// Explicit OAuth bearer token; when `None`, the credential chain in
    /// [`crate::auth`] decides.
    pub oauth_token: Option<String>,
    pub poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl TestLabConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Try to load .env file if it exists (ignore if it doesn't)
        let _ = dotenvy::dotenv();

        let gcp_project = env::var("XCTESTLAB_GCP_PROJECT")
            .map_err(|_| Error::Config("XCTESTLAB_GCP_PROJECT not set".to_string()))?;

        let oauth_token = env::var("GOOGLE_OAUTH_ACCESS_TOKEN").ok();

        let poll_interval_seconds = env::var("XCTESTLAB_POLL_INTERVAL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS);

        let request_timeout_seconds = env::var("XCTESTLAB_REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        let connect_timeout_seconds = env::var("XCTESTLAB_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            gcp_project,
            oauth_token,
            poll_interval_seconds,
            request_timeout_seconds,
            connect_timeout_seconds,
        })
    }

    /// Create a new configuration with explicit values
    pub fn new(gcp_project: String, oauth_token: Option<String>) -> Self {
        Self {
            gcp_project,
            oauth_token,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            request_timeout_seconds: 60,
            connect_timeout_seconds: 10,
        }
    }
}
