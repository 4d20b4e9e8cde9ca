//! Operator-facing messages for terminal matrix states and invalid-matrix
//! detail codes.
//!
//! The coarse table covers the six terminal error states a matrix can land
//! in. The fine table translates the service's `invalidMatrixDetails` codes;
//! it refines the coarse INVALID message when the service supplies a code,
//! and is never consulted for any other state.

use crate::types::MatrixState;

/// Fixed message for a terminal error state. `None` for states that are not
/// terminal errors (in-progress, finished, unknown).
pub fn error_state_message(state: &MatrixState) -> Option<&'static str> {
    match state {
        MatrixState::Error => Some(
            "The execution or matrix has stopped because it encountered an infrastructure failure.",
        ),
        MatrixState::UnsupportedEnvironment => Some(
            "The execution was not run because it corresponds to a unsupported environment.",
        ),
        MatrixState::IncompatibleEnvironment => Some(
            "The execution was not run because the provided inputs are incompatible with the \
             requested environment",
        ),
        MatrixState::IncompatibleArchitecture => Some(
            "The execution was not run because the provided inputs are incompatible with the \
             requested architecture.",
        ),
        MatrixState::Cancelled => Some("The user cancelled the execution."),
        MatrixState::Invalid => Some(
            "The execution or matrix was not run because the provided inputs are not valid.",
        ),
        _ => None,
    }
}

/// Explanation for an `invalidMatrixDetails` code, when we recognize it.
pub fn invalid_matrix_detail_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "MALFORMED_APK" => "The app APK is not a valid Android application",
        "MALFORMED_TEST_APK" => "The test APK is not a valid Android instrumentation test",
        "NO_MANIFEST" => "The app APK is missing the manifest file",
        "NO_PACKAGE_NAME" => "The APK manifest file is missing the package name",
        "TEST_SAME_AS_APP" => "The test APK is the same as the app APK",
        "NO_INSTRUMENTATION" => "The test APK declares no instrumentation tags in the manifest",
        "NO_SIGNATURE" => "At least one supplied APK file has a missing or invalid signature",
        "INSTRUMENTATION_ORCHESTRATOR_INCOMPATIBLE" => {
            "The test runner class specified by the user or the test APK's manifest file \
             is not compatible with Android Test Orchestrator. \
             Please use AndroidJUnitRunner version 1.0 or higher"
        }
        "NO_TEST_RUNNER_CLASS" => {
            "The test APK does not contain the test runner class specified by \
             the user or the manifest file. The test runner class name may be \
             incorrect, or the class may be mislocated in the app APK."
        }
        "NO_LAUNCHER_ACTIVITY" => "The app APK does not specify a main launcher activity",
        "FORBIDDEN_PERMISSIONS" => "The app declares one or more permissions that are not allowed",
        "INVALID_ROBO_DIRECTIVES" => "Cannot have multiple robo-directives with the same resource name",
        "TEST_LOOP_INTENT_FILTER_NOT_FOUND" => {
            "The app does not have a correctly formatted game-loop intent filter"
        }
        "SCENARIO_LABEL_NOT_DECLARED" => "A scenario-label was not declared in the manifest file",
        "SCENARIO_LABEL_MALFORMED" => {
            "A scenario-label in the manifest includes invalid numbers or ranges"
        }
        "SCENARIO_NOT_DECLARED" => "A scenario-number was not declared in the manifest file",
        "DEVICE_ADMIN_RECEIVER" => "Device administrator applications are not allowed",
        "MALFORMED_XC_TEST_ZIP" => {
            "The XCTest zip file was malformed. The zip did not contain a single \
             .xctestrun file and the contents of the DerivedData/Build/Products directory."
        }
        "BUILT_FOR_IOS_SIMULATOR" => {
            "The provided XCTest was built for the iOS simulator rather than for \
             a physical device"
        }
        "NO_TESTS_IN_XC_TEST_ZIP" => "The .xctestrun file did not specify any test targets to run",
        "USE_DESTINATION_ARTIFACTS" => {
            "One or more of the test targets defined in the .xctestrun file \
             specifies \"UseDestinationArtifacts\", which is not allowed"
        }
        "TEST_NOT_APP_HOSTED" => {
            "One or more of the test targets defined in the .xctestrun file \
             does not have a host binary to run on the physical iOS device, \
             which may cause errors when running xcodebuild"
        }
        "NO_CODE_APK" => "\"hasCode\" is false in the Manifest. Tested APKs must contain code",
        "INVALID_INPUT_APK" => {
            "Either the provided input APK path was malformed, the APK file does \
             not exist, or the user does not have permission to access the file"
        }
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_six_terminal_error_states_are_mapped() {
        let states = [
            MatrixState::Error,
            MatrixState::UnsupportedEnvironment,
            MatrixState::IncompatibleEnvironment,
            MatrixState::IncompatibleArchitecture,
            MatrixState::Cancelled,
            MatrixState::Invalid,
        ];
        for state in states {
            assert!(error_state_message(&state).is_some(), "{state} unmapped");
        }
    }

    #[test]
    fn non_error_states_have_no_message() {
        for state in [
            MatrixState::Validating,
            MatrixState::Pending,
            MatrixState::Running,
            MatrixState::Finished,
            MatrixState::Unknown("BRAND_NEW".into()),
        ] {
            assert_eq!(error_state_message(&state), None);
        }
    }

    #[test]
    fn invalid_matrix_details_refine_known_codes_only() {
        assert!(
            invalid_matrix_detail_message("MALFORMED_XC_TEST_ZIP")
                .unwrap()
                .contains(".xctestrun")
        );
        assert!(
            invalid_matrix_detail_message("BUILT_FOR_IOS_SIMULATOR")
                .unwrap()
                .contains("simulator")
        );
        assert_eq!(invalid_matrix_detail_message("NOT_A_REAL_CODE"), None);
    }
}
