//! Result aggregation for a finished matrix.
//!
//! Two tiers feed the verdict. The execution tier only confirms the job ran
//! to completion on every requested device; it says nothing about whether
//! tests passed. The step tier classifies each test step's outcome. The
//! logged report lines are presentation; the returned counts are the
//! contract.

use crate::types::{MatrixState, MatrixStatus, Step, StepOutcome};
use tracing::{error, info, warn};

pub const CONSOLE_BASE: &str = "https://console.firebase.google.com";

/// Overall outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub success: bool,
    pub execution_failures: usize,
    pub step_failures: usize,
    pub inconclusive_steps: usize,
}

impl Verdict {
    /// A run that is considered successful without result aggregation, e.g.
    /// an asynchronous submission.
    pub fn passed() -> Self {
        Self {
            success: true,
            execution_failures: 0,
            step_failures: 0,
            inconclusive_steps: 0,
        }
    }

    pub fn from_tiers(execution_failures: usize, steps: &StepTally) -> Self {
        Self {
            success: execution_failures == 0 && steps.failures == 0 && steps.inconclusive == 0,
            execution_failures,
            step_failures: steps.failures,
            inconclusive_steps: steps.inconclusive,
        }
    }
}

/// Step-tier counts against the verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepTally {
    pub failures: usize,
    pub inconclusive: usize,
}

/// Human-facing link to the run in the Firebase console.
pub fn console_link(project: &str, history_id: &str, execution_id: &str) -> String {
    format!(
        "{CONSOLE_BASE}/project/{project}/testlab/histories/{history_id}/matrices/{execution_id}"
    )
}

fn step_link(project: &str, history_id: &str, execution_id: &str, step_id: &str) -> String {
    format!(
        "{}/executions/{}",
        console_link(project, history_id, execution_id),
        step_id
    )
}

/// Walk per-device executions of a finished matrix and count the ones that
/// did not run to completion.
pub fn execution_failures(status: &MatrixStatus) -> usize {
    info!("Test job(s) are finalized");
    info!("-------------------------");
    info!("|   EXECUTION RESULTS   |");
    let mut failures = 0;
    for execution in &status.test_executions {
        info!("-------------------------");
        let line = format!("{}: {}", execution.id, execution.state);
        if execution.state == MatrixState::Finished {
            info!("{line}");
        } else {
            failures += 1;
            error!("{line}");
        }

        // Device build logs, when the service reported any
        if let Some(details) = &execution.test_details {
            if let Some(messages) = &details.progress_messages {
                for message in messages {
                    info!("{message}");
                }
            }
        }
    }

    info!("-------------------------");
    if failures > 0 {
        error!("{failures} execution(s) have failed to complete.");
    } else {
        info!("All jobs have ran and completed.");
    }
    failures
}

/// Classify each step's outcome. `skipped` does not count against the
/// verdict; `inconclusive` and `failure` both do.
pub fn step_tally(
    project: &str,
    history_id: &str,
    execution_id: &str,
    steps: &[Step],
) -> StepTally {
    let mut tally = StepTally::default();

    info!("-------------------------");
    info!("|      TEST OUTCOME     |");
    for step in steps {
        info!("-------------------------");
        info!("Test step: {}", step.step_id);
        info!("Execution time: {} seconds", step.run_duration_seconds());

        let outcome = step.outcome();
        match outcome {
            StepOutcome::Success => info!("Result: {outcome}"),
            StepOutcome::Skipped => info!("Result: {outcome}"),
            StepOutcome::Inconclusive => {
                tally.inconclusive += 1;
                error!("Result: {outcome}");
            }
            StepOutcome::Failure => {
                tally.failures += 1;
                error!("Result: {outcome}");
            }
            StepOutcome::Unknown(_) => warn!("Result: {outcome}"),
        }
        info!(
            "For details, go to {}",
            step_link(project, history_id, execution_id, &step.step_id)
        );
    }

    info!("-------------------------");
    if tally.failures == 0 && tally.inconclusive == 0 {
        info!("All executions are completed successfully!");
    }
    if tally.failures > 0 {
        error!("{} step(s) have failed.", tally.failures);
    }
    if tally.inconclusive > 0 {
        error!("{} step(s) yielded inconclusive outcomes.", tally.inconclusive);
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(executions: serde_json::Value) -> MatrixStatus {
        serde_json::from_value(json!({
            "state": "FINISHED",
            "testExecutions": executions
        }))
        .unwrap()
    }

    fn step(outcome: &str) -> Step {
        serde_json::from_value(json!({
            "stepId": format!("step-{outcome}"),
            "outcome": {"summary": outcome},
            "runDuration": {"seconds": 1}
        }))
        .unwrap()
    }

    #[test]
    fn execution_tier_counts_unfinished_executions() {
        let status = status(json!([
            {"id": "iphonex-11.2", "state": "FINISHED"},
            {"id": "iphone8-11.2", "state": "ERROR",
             "testDetails": {"progressMessages": ["Installing the app"]}},
            {"id": "iphone7-11.0", "state": "CANCELLED"}
        ]));
        assert_eq!(execution_failures(&status), 2);
    }

    #[test]
    fn execution_tier_passes_when_all_finished() {
        let status = status(json!([
            {"id": "a", "state": "FINISHED"},
            {"id": "b", "state": "FINISHED"}
        ]));
        assert_eq!(execution_failures(&status), 0);
    }

    #[test]
    fn step_tier_ignores_success_and_skipped() {
        let steps = vec![step("success"), step("skipped"), step("success")];
        let tally = step_tally("p", "h1", "e1", &steps);
        assert_eq!(tally, StepTally::default());
        assert!(Verdict::from_tiers(0, &tally).success);
    }

    #[test]
    fn step_tier_counts_failures_and_inconclusive() {
        let steps = vec![
            step("success"),
            step("failure"),
            step("inconclusive"),
            step("failure"),
        ];
        let tally = step_tally("p", "h1", "e1", &steps);
        assert_eq!(tally.failures, 2);
        assert_eq!(tally.inconclusive, 1);

        let verdict = Verdict::from_tiers(0, &tally);
        assert!(!verdict.success);
        assert_eq!(verdict.step_failures, 2);
        assert_eq!(verdict.inconclusive_steps, 1);
    }

    #[test]
    fn verdict_fails_on_execution_failures_alone() {
        let verdict = Verdict::from_tiers(1, &StepTally::default());
        assert!(!verdict.success);
        assert_eq!(verdict.execution_failures, 1);
    }

    #[test]
    fn console_and_step_links() {
        assert_eq!(
            console_link("my-project", "h1", "e1"),
            "https://console.firebase.google.com/project/my-project/testlab/histories/h1/matrices/e1"
        );
        assert_eq!(
            step_link("my-project", "h1", "e1", "s1"),
            "https://console.firebase.google.com/project/my-project/testlab/histories/h1/matrices/e1/executions/s1"
        );
    }
}
