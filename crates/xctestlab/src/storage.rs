//! Single-pass upload of the app bundle to Google Cloud Storage.
//!
//! Test Lab requires the bundle to already live in a bucket before a matrix
//! can be created; a local path is uploaded into a per-run work folder and
//! the resulting `gs://` link goes into the matrix request.

use crate::config::TestLabConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

pub struct GcsClient {
    client: Client,
    token: String,
    base: String,
}

impl GcsClient {
    pub fn new(config: &TestLabConfig, token: String) -> Result<Self> {
        Self::with_base_url(config, token, STORAGE_ENDPOINT)
    }

    pub fn with_base_url(config: &TestLabConfig, token: String, base: &str) -> Result<Self> {
        // Uploads can be large; the overall timeout is deliberately long
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            token,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Upload a local file to `gs://{bucket}/{object}` and return that link.
    pub async fn upload_file(&self, local: &Path, bucket: &str, object: &str) -> Result<String> {
        let data = tokio::fs::read(local).await?;
        info!(
            "Uploading {} ({} bytes) to gs://{}/{}",
            local.display(),
            data.len(),
            bucket,
            object
        );

        let url = format!("{}/upload/storage/v1/b/{}/o", self.base, bucket);
        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object)])
            .bearer_auth(&self.token)
            .header("content-type", "application/octet-stream")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Failed to upload the app bundle: {} - {}",
                status,
                crate::api::summarize_api_error(&body)
            )));
        }

        debug!("Upload complete");
        Ok(format!("gs://{bucket}/{object}"))
    }
}

/// Per-run work folder under the default bucket, unique enough that two runs
/// started in the same second do not collide.
pub fn workfolder_name() -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%SZ");
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!("xctestlab-{timestamp}-{}", &nonce[..6])
}
