//! Wire types for the Test Lab and Tool Results APIs.
//!
//! Field names are a contract with the remote service; every struct uses the
//! exact camelCase names the service sends. Fields are `Option` exactly where
//! the service may omit them — absence means "not ready yet" during polling
//! and "contract violation" once the matrix is finished, and the callers
//! keep those two cases apart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One requested device in the environment matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IosDevice {
    pub ios_model_id: String,
    pub ios_version_id: String,
    pub locale: String,
    pub orientation: String,
}

impl IosDevice {
    pub fn new(model_id: &str, version_id: &str) -> Self {
        Self {
            ios_model_id: model_id.to_string(),
            ios_version_id: version_id.to_string(),
            locale: "en_US".to_string(),
            orientation: "portrait".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMatrixRequest {
    pub project_id: String,
    pub test_specification: TestSpecification,
    pub environment_matrix: EnvironmentMatrix,
    pub result_storage: ResultStorageRequest,
}

impl TestMatrixRequest {
    pub fn new(
        project_id: &str,
        app_gcs_path: &str,
        result_gcs_path: &str,
        devices: Vec<IosDevice>,
        timeout_sec: u64,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            test_specification: TestSpecification {
                test_timeout: DurationSpec {
                    seconds: timeout_sec,
                },
                ios_test_setup: IosTestSetup {},
                ios_xc_test: IosXcTest {
                    tests_zip: FileReference {
                        gcs_path: app_gcs_path.to_string(),
                    },
                },
            },
            environment_matrix: EnvironmentMatrix {
                ios_device_list: IosDeviceList {
                    ios_devices: devices,
                },
            },
            result_storage: ResultStorageRequest {
                google_cloud_storage: GcsDestination {
                    gcs_path: result_gcs_path.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSpecification {
    pub test_timeout: DurationSpec,
    pub ios_test_setup: IosTestSetup,
    pub ios_xc_test: IosXcTest,
}

#[derive(Debug, Clone, Serialize)]
pub struct DurationSpec {
    pub seconds: u64,
}

/// Empty on purpose; the service applies its defaults.
#[derive(Debug, Clone, Serialize)]
pub struct IosTestSetup {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IosXcTest {
    pub tests_zip: FileReference,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub gcs_path: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentMatrix {
    pub ios_device_list: IosDeviceList,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IosDeviceList {
    pub ios_devices: Vec<IosDevice>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStorageRequest {
    pub google_cloud_storage: GcsDestination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsDestination {
    pub gcs_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatrixResponse {
    pub test_matrix_id: Option<String>,
}

/// Remote state of a test matrix or of a single device execution.
///
/// The service's state enumeration may grow; an unrecognized label is kept
/// verbatim in `Unknown` so the poller can surface it instead of silently
/// looping on it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum MatrixState {
    Validating,
    Pending,
    Running,
    Finished,
    Error,
    UnsupportedEnvironment,
    IncompatibleEnvironment,
    IncompatibleArchitecture,
    Cancelled,
    Invalid,
    Unknown(String),
}

impl From<String> for MatrixState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "VALIDATING" => MatrixState::Validating,
            "PENDING" => MatrixState::Pending,
            "RUNNING" => MatrixState::Running,
            "FINISHED" => MatrixState::Finished,
            "ERROR" => MatrixState::Error,
            "UNSUPPORTED_ENVIRONMENT" => MatrixState::UnsupportedEnvironment,
            "INCOMPATIBLE_ENVIRONMENT" => MatrixState::IncompatibleEnvironment,
            "INCOMPATIBLE_ARCHITECTURE" => MatrixState::IncompatibleArchitecture,
            "CANCELLED" => MatrixState::Cancelled,
            "INVALID" => MatrixState::Invalid,
            _ => MatrixState::Unknown(s),
        }
    }
}

impl fmt::Display for MatrixState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatrixState::Validating => "VALIDATING",
            MatrixState::Pending => "PENDING",
            MatrixState::Running => "RUNNING",
            MatrixState::Finished => "FINISHED",
            MatrixState::Error => "ERROR",
            MatrixState::UnsupportedEnvironment => "UNSUPPORTED_ENVIRONMENT",
            MatrixState::IncompatibleEnvironment => "INCOMPATIBLE_ENVIRONMENT",
            MatrixState::IncompatibleArchitecture => "INCOMPATIBLE_ARCHITECTURE",
            MatrixState::Cancelled => "CANCELLED",
            MatrixState::Invalid => "INVALID",
            MatrixState::Unknown(s) => s,
        };
        f.write_str(label)
    }
}

impl MatrixState {
    /// The matrix is still making progress and should be polled again.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            MatrixState::Validating | MatrixState::Pending | MatrixState::Running
        )
    }
}

/// One poll's view of the matrix. Superseded wholesale by the next poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixStatus {
    pub state: MatrixState,
    #[serde(default)]
    pub test_executions: Vec<TestExecution>,
    pub result_storage: Option<ResultStorageInfo>,
    pub invalid_matrix_details: Option<String>,
}

impl MatrixStatus {
    /// Both Tool Results ids, once the service has allocated them. Absence
    /// while polling just means "not ready yet".
    pub fn tool_results_ids(&self) -> Option<(&str, &str)> {
        let tool_results = self
            .result_storage
            .as_ref()?
            .tool_results_execution
            .as_ref()?;
        match (
            tool_results.history_id.as_deref(),
            tool_results.execution_id.as_deref(),
        ) {
            (Some(history), Some(execution)) => Some((history, execution)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecution {
    #[serde(default)]
    pub id: String,
    pub state: MatrixState,
    pub test_details: Option<TestDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDetails {
    pub progress_messages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStorageInfo {
    pub tool_results_execution: Option<ToolResultsExecution>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultsExecution {
    pub history_id: Option<String>,
    pub execution_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepsResponse {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub step_id: String,
    pub outcome: Option<Outcome>,
    pub run_duration: Option<RunDuration>,
}

impl Step {
    pub fn outcome(&self) -> StepOutcome {
        self.outcome
            .as_ref()
            .map(|o| StepOutcome::from(o.summary.clone()))
            .unwrap_or_else(|| StepOutcome::Unknown(String::new()))
    }

    pub fn run_duration_seconds(&self) -> u64 {
        self.run_duration
            .as_ref()
            .and_then(|d| d.seconds)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunDuration {
    pub seconds: Option<u64>,
}

/// Per-step outcome reported by Tool Results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Skipped,
    Inconclusive,
    Failure,
    Unknown(String),
}

impl From<String> for StepOutcome {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => StepOutcome::Success,
            "skipped" => StepOutcome::Skipped,
            "inconclusive" => StepOutcome::Inconclusive,
            "failure" => StepOutcome::Failure,
            _ => StepOutcome::Unknown(s),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepOutcome::Success => "success",
            StepOutcome::Skipped => "skipped",
            StepOutcome::Inconclusive => "inconclusive",
            StepOutcome::Failure => "failure",
            StepOutcome::Unknown(s) if s.is_empty() => "unknown",
            StepOutcome::Unknown(s) => s,
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultsSettings {
    pub default_bucket: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_wire_field_names() {
        let request = TestMatrixRequest::new(
            "my-project",
            "gs://bucket/bundle",
            "gs://bucket/results",
            vec![IosDevice::new("iphonex", "11.2")],
            180,
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["projectId"], "my-project");
        assert_eq!(
            value["testSpecification"]["testTimeout"]["seconds"],
            180
        );
        assert_eq!(
            value["testSpecification"]["iosXcTest"]["testsZip"]["gcsPath"],
            "gs://bucket/bundle"
        );
        let device = &value["environmentMatrix"]["iosDeviceList"]["iosDevices"][0];
        assert_eq!(device["iosModelId"], "iphonex");
        assert_eq!(device["iosVersionId"], "11.2");
        assert_eq!(device["locale"], "en_US");
        assert_eq!(device["orientation"], "portrait");
        assert_eq!(
            value["resultStorage"]["googleCloudStorage"]["gcsPath"],
            "gs://bucket/results"
        );
    }

    #[test]
    fn matrix_state_parses_known_and_unknown_labels() {
        assert_eq!(MatrixState::from("RUNNING".to_string()), MatrixState::Running);
        assert_eq!(
            MatrixState::from("CANCELLED".to_string()),
            MatrixState::Cancelled
        );
        assert_eq!(
            MatrixState::from("SOMETHING_NEW".to_string()),
            MatrixState::Unknown("SOMETHING_NEW".to_string())
        );
        assert!(MatrixState::Validating.is_in_progress());
        assert!(MatrixState::Pending.is_in_progress());
        assert!(MatrixState::Running.is_in_progress());
        assert!(!MatrixState::Finished.is_in_progress());
        assert!(!MatrixState::Unknown("X".into()).is_in_progress());
    }

    #[test]
    fn status_exposes_tool_results_ids_only_when_complete() {
        let status: MatrixStatus = serde_json::from_value(serde_json::json!({
            "state": "RUNNING",
            "resultStorage": {
                "toolResultsExecution": {"historyId": "h1"}
            }
        }))
        .unwrap();
        assert_eq!(status.tool_results_ids(), None);

        let status: MatrixStatus = serde_json::from_value(serde_json::json!({
            "state": "RUNNING",
            "resultStorage": {
                "toolResultsExecution": {"historyId": "h1", "executionId": "e1"}
            }
        }))
        .unwrap();
        assert_eq!(status.tool_results_ids(), Some(("h1", "e1")));

        let status: MatrixStatus =
            serde_json::from_value(serde_json::json!({"state": "PENDING"})).unwrap();
        assert_eq!(status.tool_results_ids(), None);
        assert!(status.test_executions.is_empty());
    }

    #[test]
    fn step_defaults_cover_missing_outcome_and_duration() {
        let step: Step = serde_json::from_value(serde_json::json!({
            "stepId": "s1",
            "outcome": {"summary": "failure"},
            "runDuration": {"seconds": 42}
        }))
        .unwrap();
        assert_eq!(step.outcome(), StepOutcome::Failure);
        assert_eq!(step.run_duration_seconds(), 42);

        let bare: Step = serde_json::from_value(serde_json::json!({"stepId": "s2"})).unwrap();
        assert_eq!(bare.outcome(), StepOutcome::Unknown(String::new()));
        assert_eq!(bare.run_duration_seconds(), 0);
    }
}
