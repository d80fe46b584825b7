//! Runner workspace control.

use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::session::{not_connected, send_checked, CallOutcome, Session};
use crate::transport::Request;

/// Workspace delete endpoint; scoped with `projectName`.
pub const DELETE_PATH: &str = "/workspace/delete";
/// Workspace shutdown endpoint.
pub const SHUTDOWN_PATH: &str = "/workspace/shutdown";

/// Workspace control for one session.
pub struct WorkspaceController<'a> {
    session: &'a Session,
}

impl<'a> WorkspaceController<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Delete projects and generated code from the runner's workspace.
    ///
    /// With no project name (or an empty one) everything is deleted.
    pub async fn clear(&self, project: Option<&str>) -> Result<CallOutcome<()>, ClientError> {
        let Some(transport) = self.session.transport() else {
            return Ok(not_connected("clear workspace"));
        };

        let request = match project.filter(|name| !name.is_empty()) {
            None => {
                info!("Deleting all projects from runner workspace");
                Request::get(DELETE_PATH)
            }
            Some(name) => {
                info!(project = %name, "Deleting project from runner workspace");
                Request::get(DELETE_PATH).with_query("projectName", name)
            }
        };
        send_checked(transport, request).await?;
        Ok(CallOutcome::Completed(()))
    }

    /// Ask the runner to shut down. Best effort: the answer is not checked
    /// and a failed call is only logged.
    pub async fn shutdown(&self) -> CallOutcome<()> {
        let Some(transport) = self.session.transport() else {
            return not_connected("shutdown workspace");
        };
        info!("Closing runner");

        match transport.send(Request::get(SHUTDOWN_PATH)).await {
            Ok(response) => debug!(status = response.status, "Shutdown requested"),
            Err(e) => warn!(error = %e, "Shutdown request failed"),
        }
        CallOutcome::Completed(())
    }
}
