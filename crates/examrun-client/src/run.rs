//! Starting, stopping and waiting for test runs.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use examrun_core::{RunConfiguration, RunPhase};

use crate::error::ClientError;
use crate::probe::fetch_status;
use crate::session::{not_connected, send_checked, CallOutcome, Session};
use crate::transport::Request;

/// Run-start endpoint.
pub const START_PATH: &str = "/testrun/start";
/// Run-stop endpoint; takes the grace period as `timeout`.
pub const STOP_PATH: &str = "/testrun/stop";

/// How a wait for completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The run was seen running and then finishing.
    Completed,
    /// The caller interrupted the wait; a stop was sent.
    Interrupted,
    /// There was no session to wait on.
    NotConnected,
}

/// Run control for one session.
pub struct RunController<'a> {
    session: &'a Session,
}

impl<'a> RunController<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Start a run. The configuration is sent as-is.
    pub async fn start(&self, config: &RunConfiguration) -> Result<CallOutcome<()>, ClientError> {
        let Some(transport) = self.session.transport() else {
            return Ok(not_connected("start test run"));
        };
        info!(model = ?config.model_name(), "Starting test run");

        let body =
            serde_json::to_value(config).map_err(|e| ClientError::Serialization(e.to_string()))?;
        send_checked(transport, Request::post(START_PATH).with_json(body)).await?;
        Ok(CallOutcome::Completed(()))
    }

    /// Stop the current run, giving the runner its configured grace period.
    pub async fn stop(&self) -> Result<CallOutcome<()>, ClientError> {
        let Some(transport) = self.session.transport() else {
            return Ok(not_connected("stop test run"));
        };
        let grace_secs = self.session.config().stop_timeout_secs;
        info!(grace_secs, "Stopping test run");

        let request = Request::post(STOP_PATH).with_query("timeout", grace_secs.to_string());
        send_checked(transport, request).await?;
        Ok(CallOutcome::Completed(()))
    }

    /// Block until the run finishes or `interrupt` is cancelled.
    ///
    /// The run counts as finished only after the runner has reported the
    /// expected job and then reported it as no longer running. An interrupt
    /// is checked before every poll and always wins: the run is stopped and
    /// the wait returns without looking at further status. There is no
    /// timeout; cancel the token to bound the wait.
    ///
    /// Status errors end the wait and are returned.
    pub async fn wait_for_completion(
        &self,
        interrupt: &CancellationToken,
    ) -> Result<WaitOutcome, ClientError> {
        let Some(transport) = self.session.transport() else {
            warn!("No runner connected, nothing to wait for");
            return Ok(WaitOutcome::NotConnected);
        };
        let config = self.session.config();
        let expected_job = config.expected_job.as_str();
        let interval = config.poll.status_interval;

        info!(job = %expected_job, "Waiting for test run to finish");
        let mut phase = RunPhase::default();
        loop {
            if interrupt.is_cancelled() {
                info!(phase = ?phase, "Wait interrupted");
                let _ = self.stop().await?;
                return Ok(WaitOutcome::Interrupted);
            }

            let status = fetch_status(transport).await?;
            let next = phase.advance(&status, expected_job);
            if next != phase {
                info!(from = ?phase, to = ?next, "Test run phase changed");
                phase = next;
            }
            if phase.is_terminal() {
                info!(job = %expected_job, "Test run finished");
                return Ok(WaitOutcome::Completed);
            }

            tokio::select! {
                _ = interrupt.cancelled() => {}
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}
