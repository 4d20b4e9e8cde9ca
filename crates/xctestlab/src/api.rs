use crate::config::TestLabConfig;
use crate::error::{Error, Result};
use crate::poller::MatrixService;
use crate::types::*;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

const TESTING_ENDPOINT: &str = "https://testing.googleapis.com";
const APIARY_ENDPOINT: &str = "https://www.googleapis.com";

/// Client for the Firebase Test Lab and Tool Results APIs.
pub struct TestLabApi {
    client: Client,
    project: String,
    token: String,
    testing_base: String,
    toolresults_base: String,
}

impl TestLabApi {
    /// Create a new Test Lab API client with configuration and a resolved
    /// bearer token.
    pub fn new(config: &TestLabConfig, token: String) -> Result<Self> {
        Self::with_base_urls(config, token, TESTING_ENDPOINT, APIARY_ENDPOINT)
    }

    /// Same as [`TestLabApi::new`] but against explicit endpoints. Used by
    /// tests to point the client at a local server.
    pub fn with_base_urls(
        config: &TestLabConfig,
        token: String,
        testing_base: &str,
        toolresults_base: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            project: config.gcp_project.clone(),
            token,
            testing_base: testing_base.trim_end_matches('/').to_string(),
            toolresults_base: toolresults_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Submit a test matrix. Returns the matrix ID the service allocated.
    ///
    /// A 2xx response without a `testMatrixId` is a contract violation and
    /// fails with [`Error::MissingMatrixId`]; re-submitting would create a
    /// brand new job, so nothing is retried.
    pub async fn create_test_matrix(&self, request: &TestMatrixRequest) -> Result<String> {
        info!("Submitting test matrix for project {}", self.project);

        let url = format!(
            "{}/v1/projects/{}/testMatrices",
            self.testing_base, self.project
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("content-type", "application/json")
            .header("X-Goog-User-Project", &self.project)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Failed to start Firebase Test Lab job: {} - {}",
                status,
                summarize_api_error(&body)
            )));
        }

        let created: CreateMatrixResponse = response.json().await?;
        let matrix_id = created.test_matrix_id.ok_or(Error::MissingMatrixId)?;
        info!("Matrix ID for this submission: {}", matrix_id);

        Ok(matrix_id)
    }

    /// Fetch the current state of a matrix.
    pub async fn get_test_matrix(&self, matrix_id: &str) -> Result<MatrixStatus> {
        debug!("Fetching state of matrix {}", matrix_id);

        let url = format!(
            "{}/v1/projects/{}/testMatrices/{}",
            self.testing_base, self.project, matrix_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Failed to obtain test results: {} - {}",
                status,
                summarize_api_error(&body)
            )));
        }

        Ok(response.json().await?)
    }

    /// Fetch per-step outcomes from Tool Results for a finished execution.
    pub async fn get_execution_steps(
        &self,
        history_id: &str,
        execution_id: &str,
    ) -> Result<Vec<Step>> {
        debug!(
            "Fetching steps for history {} execution {}",
            history_id, execution_id
        );

        let url = format!(
            "{}/toolresults/v1beta3/projects/{}/histories/{}/executions/{}/steps",
            self.toolresults_base, self.project, history_id, execution_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Failed to obtain test step outcomes: {} - {}",
                status,
                summarize_api_error(&body)
            )));
        }

        let steps: StepsResponse = response.json().await?;
        Ok(steps.steps)
    }

    /// The project's default Tool Results bucket, initializing the project
    /// settings on first use.
    pub async fn get_default_bucket(&self) -> Result<String> {
        debug!("Fetching default bucket for project {}", self.project);

        let url = format!(
            "{}/toolresults/v1beta3/projects/{}/settings",
            self.toolresults_base, self.project
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Failed to obtain default bucket for Firebase Test Lab: {} - {}",
                status,
                summarize_api_error(&body)
            )));
        }

        let settings: ToolResultsSettings = response.json().await?;
        match settings.default_bucket {
            Some(bucket) => Ok(bucket),
            None => self.initialize_settings().await,
        }
    }

    /// Ask Tool Results to allocate project settings, which creates the
    /// default bucket.
    async fn initialize_settings(&self) -> Result<String> {
        info!("Initializing Tool Results settings for {}", self.project);

        let url = format!(
            "{}/toolresults/v1beta3/projects/{}:initializeSettings",
            self.toolresults_base, self.project
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Failed to initialize Tool Results settings: {} - {}",
                status,
                summarize_api_error(&body)
            )));
        }

        let settings: ToolResultsSettings = response.json().await?;
        settings.default_bucket.ok_or_else(|| {
            Error::UnexpectedResponse("project settings carry no default bucket".to_string())
        })
    }
}

#[async_trait]
impl MatrixService for TestLabApi {
    async fn fetch_matrix(&self, matrix_id: &str) -> Result<MatrixStatus> {
        self.get_test_matrix(matrix_id).await
    }

    async fn fetch_steps(&self, history_id: &str, execution_id: &str) -> Result<Vec<Step>> {
        self.get_execution_steps(history_id, execution_id).await
    }
}

/// Pull the inner message out of a Google error envelope; fall back to the
/// raw body when it does not parse.
pub fn summarize_api_error(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    value["error"]["message"]
        .as_str()
        .map(|m| m.to_string())
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn api_for(server: &MockServer) -> TestLabApi {
        let config = TestLabConfig::new("my-project".to_string(), None);
        TestLabApi::with_base_urls(
            &config,
            "test-token".to_string(),
            &server.base_url(),
            &server.base_url(),
        )
        .unwrap()
    }

    fn sample_request() -> TestMatrixRequest {
        TestMatrixRequest::new(
            "my-project",
            "gs://bucket/bundle",
            "gs://bucket/results",
            vec![IosDevice::new("iphonex", "11.2")],
            180,
        )
    }

    #[tokio::test]
    async fn create_matrix_returns_id() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/projects/my-project/testMatrices")
                    .header("x-goog-user-project", "my-project")
                    .json_body_partial(r#"{"projectId": "my-project"}"#);
                then.status(200).json_body(json!({"testMatrixId": "m-1"}));
            })
            .await;

        let api = api_for(&server);
        let matrix_id = api.create_test_matrix(&sample_request()).await.unwrap();

        assert_eq!(matrix_id, "m-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_matrix_without_id_is_a_contract_violation() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/projects/my-project/testMatrices");
                then.status(200).json_body(json!({}));
            })
            .await;

        let api = api_for(&server);
        let err = api.create_test_matrix(&sample_request()).await.unwrap_err();
        assert!(matches!(err, Error::MissingMatrixId));
    }

    #[tokio::test]
    async fn create_matrix_surfaces_error_envelope_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/projects/my-project/testMatrices");
                then.status(403)
                    .json_body(json!({"error": {"message": "Cloud Testing API is disabled"}}));
            })
            .await;

        let api = api_for(&server);
        let err = api.create_test_matrix(&sample_request()).await.unwrap_err();
        match err {
            Error::Api(message) => {
                assert!(message.contains("Cloud Testing API is disabled"));
                assert!(message.contains("403"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_matrix_parses_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/projects/my-project/testMatrices/m-1");
                then.status(200).json_body(json!({
                    "state": "RUNNING",
                    "testExecutions": [{"id": "iphonex-11.2", "state": "RUNNING"}]
                }));
            })
            .await;

        let api = api_for(&server);
        let status = api.get_test_matrix("m-1").await.unwrap();
        assert_eq!(status.state, crate::types::MatrixState::Running);
        assert_eq!(status.test_executions.len(), 1);
    }

    #[tokio::test]
    async fn get_steps_unwraps_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(
                    "/toolresults/v1beta3/projects/my-project/histories/h1/executions/e1/steps",
                );
                then.status(200).json_body(json!({
                    "steps": [
                        {"stepId": "s1", "outcome": {"summary": "success"},
                         "runDuration": {"seconds": 12}}
                    ]
                }));
            })
            .await;

        let api = api_for(&server);
        let steps = api.get_execution_steps("h1", "e1").await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].step_id, "s1");
    }

    #[tokio::test]
    async fn default_bucket_initializes_settings_when_absent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/toolresults/v1beta3/projects/my-project/settings");
                then.status(200).json_body(json!({}));
            })
            .await;
        let init = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/toolresults/v1beta3/projects/my-project:initializeSettings");
                then.status(200)
                    .json_body(json!({"defaultBucket": "test-lab-bucket"}));
            })
            .await;

        let api = api_for(&server);
        let bucket = api.get_default_bucket().await.unwrap();
        assert_eq!(bucket, "test-lab-bucket");
        init.assert_async().await;
    }

    #[test]
    fn error_envelope_falls_back_to_raw_body() {
        assert_eq!(
            summarize_api_error(r#"{"error": {"message": "quota exceeded"}}"#),
            "quota exceeded"
        );
        assert_eq!(summarize_api_error("<html>bad gateway</html>"), "<html>bad gateway</html>");
        assert_eq!(summarize_api_error(r#"{"ok": true}"#), r#"{"ok": true}"#);
    }
}
