//! Session lifecycle: the transport handle to the runner and its teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::HttpConnector;
use crate::run::RunController;
use crate::transport::{Connector, Request, Response, Transport};
use crate::workspace::WorkspaceController;

/// Result of a call that needs a live session.
///
/// Calls made without a handle are skipped with a warning rather than
/// failing, so a pipeline without a configured runner keeps going.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum CallOutcome<T> {
    /// The call was made and succeeded.
    Completed(T),
    /// There was no handle; nothing was sent.
    NotConnected,
}

impl<T> CallOutcome<T> {
    /// Returns true if the call was skipped.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }

    /// The value, if the call was made.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::NotConnected => None,
        }
    }
}

/// Connection state between this client and one runner.
///
/// Holds at most one transport handle. Everything except [`Session::connect`]
/// and [`Session::is_available`] is a logged no-op while no handle exists.
pub struct Session {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    handle: Option<Box<dyn Transport>>,
}

impl Session {
    /// Create a session that talks HTTP to `config.base_url`.
    ///
    /// No handle is opened until [`Session::connect`].
    pub fn new(config: ClientConfig) -> Self {
        let connector = Arc::new(HttpConnector::new(config.request_timeout));
        Self::with_connector(config, connector)
    }

    /// Create a session that opens handles through `connector`.
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            handle: None,
        }
    }

    /// Base URL all calls are made against.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns true while a transport handle is held.
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Run control on this session.
    pub fn runs(&self) -> RunController<'_> {
        RunController::new(self)
    }

    /// Workspace control on this session.
    pub fn workspace(&self) -> WorkspaceController<'_> {
        WorkspaceController::new(self)
    }

    pub(crate) fn transport(&self) -> Option<&dyn Transport> {
        self.handle.as_deref()
    }

    /// Open the handle unless one is already held.
    pub(crate) fn create_handle(&mut self) -> Result<(), ClientError> {
        if self.handle.is_some() {
            info!(base_url = %self.config.base_url, "Client already connected");
            return Ok(());
        }
        self.handle = Some(self.connector.open(&self.config.base_url)?);
        debug!(base_url = %self.config.base_url, "Opened runner handle");
        Ok(())
    }

    /// Release the handle. Safe to call at any time.
    pub fn destroy_handle(&mut self) {
        if self.handle.take().is_some() {
            debug!(base_url = %self.config.base_url, "Released runner handle");
        }
    }

    /// Open the handle and wait for the runner to answer.
    ///
    /// Returns true as soon as one probe succeeds, false once `timeout` has
    /// passed without that. The handle stays open either way.
    pub async fn connect(&mut self, timeout: Duration) -> bool {
        info!(base_url = %self.config.base_url, "Connecting to runner");
        if let Err(e) = self.create_handle() {
            error!(error = %e, "Failed to open runner handle");
            return false;
        }

        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.is_available().await {
                info!(base_url = %self.config.base_url, "Runner is available");
                return true;
            }
            pause_before(self.config.poll.probe_interval, deadline).await;
        }

        error!(timeout = ?timeout, "Runner does not answer in time");
        false
    }

    /// Ask the runner to shut down, wait for it to go away, release the handle.
    ///
    /// Nothing here fails: a shutdown call that errors and a runner that is
    /// still up at the deadline are both logged. The handle is always released.
    pub async fn disconnect(&mut self, timeout: Duration) {
        if self.handle.is_none() {
            info!("Client is not connected");
            return;
        }
        info!(base_url = %self.config.base_url, "Disconnecting from runner");

        let _ = self.workspace().shutdown().await;

        let deadline = Instant::now() + timeout;
        let mut shutdown_confirmed = false;
        while Instant::now() < deadline {
            if !self.is_available().await {
                shutdown_confirmed = true;
                break;
            }
            pause_before(self.config.poll.probe_interval, deadline).await;
        }
        if !shutdown_confirmed {
            error!(timeout = ?timeout, "Runner does not shut down in time");
        }

        self.destroy_handle();
    }
}

/// Wait before the next probe, never past `deadline`.
async fn pause_before(interval: Duration, deadline: Instant) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
        return;
    }
    let wake = (Instant::now() + interval).min(deadline);
    tokio::time::sleep_until(wake).await;
}

/// Log a skipped call.
pub(crate) fn not_connected<T>(operation: &str) -> CallOutcome<T> {
    warn!(operation, "No runner connected");
    CallOutcome::NotConnected
}

/// Send a call whose status must be 200.
pub(crate) async fn send_checked(
    transport: &dyn Transport,
    request: Request,
) -> Result<Response, ClientError> {
    let target = request.target();
    let response = transport.send(request).await?;
    if !response.is_ok() {
        return Err(ClientError::Remote {
            status: response.status,
            path: target,
        });
    }
    Ok(response)
}
