use crate::api::TestLabApi;
use crate::auth;
use crate::config::TestLabConfig;
use crate::error::{Error, Result};
use crate::poller::ResultPoller;
use crate::report::Verdict;
use crate::storage::{self, GcsClient};
use crate::types::{IosDevice, TestMatrixRequest};
use crate::validator;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const DEFAULT_APP_BUNDLE_NAME: &str = "bundle";
const MAX_TIMEOUT_SEC: u64 = 45 * 60;

/// Parameters for one Test Lab run.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Local path to the XCTest zip, or a `gs://` link to a bundle that is
    /// already in Cloud Storage.
    pub app_path: String,
    pub devices: Vec<IosDevice>,
    pub timeout_sec: u64,
    /// `gs://` destination for results; defaults to a per-run work folder
    /// under the project's default bucket.
    pub result_storage: Option<String>,
    /// Submit and return immediately instead of waiting for results.
    pub async_submit: bool,
}

impl RunParams {
    pub fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(Error::Config("devices cannot be empty".to_string()));
        }
        if self.timeout_sec == 0 || self.timeout_sec > MAX_TIMEOUT_SEC {
            return Err(Error::Config(
                "timeout must be between 1 second and 45 minutes".to_string(),
            ));
        }
        if let Some(path) = &self.result_storage {
            if !path.starts_with("gs://") {
                return Err(Error::Config(format!("invalid GCS path: '{path}'")));
            }
        }
        Ok(())
    }
}

/// Orchestrates one run end to end: validate and upload the bundle, submit
/// the matrix, then poll it to a verdict (unless submitting asynchronously).
pub struct TestLabRunner {
    api: TestLabApi,
    gcs: GcsClient,
    poll_interval: Duration,
}

impl TestLabRunner {
    pub fn new(api: TestLabApi, gcs: GcsClient, poll_interval: Duration) -> Self {
        Self {
            api,
            gcs,
            poll_interval,
        }
    }

    /// Build a runner from configuration, resolving the OAuth token once for
    /// the whole run.
    pub async fn from_config(config: &TestLabConfig) -> Result<Self> {
        let token = auth::resolve_access_token(config.oauth_token.as_deref()).await?;
        let api = TestLabApi::new(config, token.clone())?;
        let gcs = GcsClient::new(config, token)?;
        Ok(Self::new(
            api,
            gcs,
            Duration::from_secs(config.poll_interval_seconds),
        ))
    }

    pub async fn run(&self, params: RunParams) -> Result<Verdict> {
        params.validate()?;

        let workfolder = storage::workfolder_name();
        // Fetched lazily and at most once per run
        let mut default_bucket: Option<String> = None;

        let app_gcs_link = if params.app_path.starts_with("gs://") {
            // Already in Cloud Storage, nothing to validate or upload
            params.app_path.clone()
        } else {
            validator::validate_xctest_zip(Path::new(&params.app_path))?;
            let bucket = self.default_bucket(&mut default_bucket).await?;
            self.gcs
                .upload_file(
                    Path::new(&params.app_path),
                    &bucket,
                    &format!("{workfolder}/{DEFAULT_APP_BUNDLE_NAME}"),
                )
                .await?
        };

        let result_storage = match &params.result_storage {
            Some(path) => path.clone(),
            None => {
                let bucket = self.default_bucket(&mut default_bucket).await?;
                format!("gs://{bucket}/{workfolder}")
            }
        };

        info!("Submitting job(s) to Firebase Test Lab");
        let request = TestMatrixRequest::new(
            self.api.project(),
            &app_gcs_link,
            &result_storage,
            params.devices,
            params.timeout_sec,
        );
        let matrix_id = self.api.create_test_matrix(&request).await?;

        if params.async_submit {
            info!("Job(s) have been submitted to Firebase Test Lab");
            return Ok(Verdict::passed());
        }

        ResultPoller::new(&self.api, self.api.project(), &matrix_id, self.poll_interval)
            .wait_for_verdict()
            .await
    }

    async fn default_bucket(&self, cache: &mut Option<String>) -> Result<String> {
        match cache {
            Some(bucket) => Ok(bucket.clone()),
            None => {
                let bucket = self.api.get_default_bucket().await?;
                *cache = Some(bucket.clone());
                Ok(bucket)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RunParams {
        RunParams {
            app_path: "gs://bucket/bundle".to_string(),
            devices: vec![IosDevice::new("iphonex", "11.2")],
            timeout_sec: 180,
            result_storage: None,
            async_submit: false,
        }
    }

    #[test]
    fn valid_params_pass() {
        assert!(params().validate().is_ok());
    }

    #[test]
    fn empty_device_list_is_rejected() {
        let mut p = params();
        p.devices.clear();
        assert!(matches!(p.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        let mut p = params();
        p.timeout_sec = 0;
        assert!(p.validate().is_err());
        p.timeout_sec = MAX_TIMEOUT_SEC;
        assert!(p.validate().is_ok());
        p.timeout_sec = MAX_TIMEOUT_SEC + 1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn result_storage_must_be_a_gcs_path() {
        let mut p = params();
        p.result_storage = Some("/tmp/results".to_string());
        assert!(matches!(p.validate(), Err(Error::Config(_))));
        p.result_storage = Some("gs://bucket/results".to_string());
        assert!(p.validate().is_ok());
    }
}
