//! Availability probing and status fetching.

use tracing::debug;

use examrun_core::RunStatus;

use crate::error::ClientError;
use crate::session::{not_connected, send_checked, CallOutcome, Session};
use crate::transport::{Request, Transport};

/// Status endpoint, also used as the availability probe.
pub const STATUS_PATH: &str = "/testrun/status";

/// Fetch and decode one status snapshot.
pub(crate) async fn fetch_status(transport: &dyn Transport) -> Result<RunStatus, ClientError> {
    send_checked(transport, Request::get(STATUS_PATH))
        .await?
        .json()
}

impl Session {
    /// Current status of the runner.
    ///
    /// Fails on a non-200 answer, an unreachable runner, or a body that is
    /// not a status.
    pub async fn status(&self) -> Result<CallOutcome<RunStatus>, ClientError> {
        let Some(transport) = self.transport() else {
            return Ok(not_connected("status"));
        };
        fetch_status(transport).await.map(CallOutcome::Completed)
    }

    /// Returns true if the runner answers a status call.
    ///
    /// Without a session handle, a transient one is opened for the probe and
    /// released again before returning.
    pub async fn is_available(&mut self) -> bool {
        let transient = !self.is_connected();
        if transient {
            if let Err(e) = self.create_handle() {
                debug!(error = %e, "Could not open probe handle");
                return false;
            }
        }

        let available = match self.transport() {
            Some(transport) => match fetch_status(transport).await {
                Ok(_) => true,
                Err(e) => {
                    debug!(error = %e, "Runner not available");
                    false
                }
            },
            None => false,
        };

        if transient {
            self.destroy_handle();
        }
        available
    }
}
