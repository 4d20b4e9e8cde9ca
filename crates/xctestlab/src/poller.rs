//! The job lifecycle state machine.
//!
//! After submission a matrix moves through `VALIDATING`/`PENDING`/`RUNNING`
//! until it lands in `FINISHED` or one of six terminal error states. The
//! poller re-fetches the matrix on a fixed interval and classifies every
//! state it sees. Terminal errors are checked before the finished check on
//! every cycle: a payload could carry an error state label alongside
//! residual finished-shaped fields, and the error wins. A state we do not
//! recognize aborts the run instead of being treated as "still running" —
//! the service's state enumeration may grow, and looping forever on a new
//! terminal state must not happen.

use crate::error::{Error, Result};
use crate::report::{self, Verdict};
use crate::taxonomy;
use crate::types::{MatrixState, MatrixStatus, Step};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Remote operations the poller needs. [`crate::api::TestLabApi`] is the
/// production implementation; tests script their own.
#[async_trait]
pub trait MatrixService: Send + Sync {
    async fn fetch_matrix(&self, matrix_id: &str) -> Result<MatrixStatus>;
    async fn fetch_steps(&self, history_id: &str, execution_id: &str) -> Result<Vec<Step>>;
}

pub struct ResultPoller<'a, S: MatrixService> {
    service: &'a S,
    project: String,
    matrix_id: String,
    interval: Duration,
    console_link_shown: bool,
}

impl<'a, S: MatrixService> ResultPoller<'a, S> {
    pub fn new(service: &'a S, project: &str, matrix_id: &str, interval: Duration) -> Self {
        Self {
            service,
            project: project.to_string(),
            matrix_id: matrix_id.to_string(),
            interval,
            console_link_shown: false,
        }
    }

    /// Poll the matrix until it reaches a terminal state, then aggregate the
    /// results into a [`Verdict`].
    ///
    /// Fatal conditions (terminal error states, unknown states, a finished
    /// matrix without result linkage, transport failures) return an error.
    /// Tests that ran but did not pass are not an error; they come back as
    /// `Verdict { success: false, .. }`.
    pub async fn wait_for_verdict(mut self) -> Result<Verdict> {
        loop {
            let status = self.service.fetch_matrix(&self.matrix_id).await?;

            self.maybe_surface_console_link(&status);

            // Terminal errors take priority over everything else
            if let Some(message) = taxonomy::error_state_message(&status.state) {
                return Err(Error::MatrixFailed {
                    state: status.state.to_string(),
                    message: refine_invalid_message(&status, message),
                });
            }

            if status.state == MatrixState::Finished {
                return self.aggregate(&status).await;
            }

            if !status.state.is_in_progress() {
                return Err(Error::UnknownState(status.state.to_string()));
            }

            debug!("Matrix {} is {}, waiting", self.matrix_id, status.state);
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Show the Firebase console link the first time both Tool Results ids
    /// appear. The ids stay present on every later poll; the link is only
    /// surfaced once.
    fn maybe_surface_console_link(&mut self, status: &MatrixStatus) -> Option<String> {
        if self.console_link_shown {
            return None;
        }
        let (history_id, execution_id) = status.tool_results_ids()?;
        let link = report::console_link(&self.project, history_id, execution_id);
        info!("Go to {} for more information about this run", link);
        self.console_link_shown = true;
        Some(link)
    }

    async fn aggregate(&self, status: &MatrixStatus) -> Result<Verdict> {
        let execution_failures = report::execution_failures(status);

        let Some((history_id, execution_id)) = status.tool_results_ids() else {
            return Err(Error::UnexpectedResponse(
                "cannot retrieve result info for the finished matrix".to_string(),
            ));
        };

        let steps = self.service.fetch_steps(history_id, execution_id).await?;
        let tally = report::step_tally(&self.project, history_id, execution_id, &steps);

        Ok(Verdict::from_tiers(execution_failures, &tally))
    }
}

fn refine_invalid_message(status: &MatrixStatus, base: &str) -> String {
    if status.state != MatrixState::Invalid {
        return base.to_string();
    }
    let Some(code) = status.invalid_matrix_details.as_deref() else {
        return base.to_string();
    };
    match taxonomy::invalid_matrix_detail_message(code) {
        Some(detail) => format!("{base} {detail}"),
        None => format!("{base} ({code})"),
    }
}
