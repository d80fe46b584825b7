//! Remote control client for a test runner.
//!
//! A [`Session`] owns the connection to the runner. Runs are driven through
//! [`Session::runs`] and the runner's workspace through [`Session::workspace`].
//!
//! ```no_run
//! # use std::time::Duration;
//! # use examrun_client::{ClientConfig, Session};
//! # use examrun_core::{ModelConfig, RunConfiguration};
//! # use tokio_util::sync::CancellationToken;
//! # async fn example() -> Result<(), examrun_client::ClientError> {
//! let mut session = Session::new(ClientConfig::new("http://localhost:8085/examRest"));
//! if session.connect(Duration::from_secs(60)).await {
//!     let config = RunConfiguration::for_model(&ModelConfig::new("Powertrain"));
//!     session.runs().start(&config).await?;
//!     session.runs().wait_for_completion(&CancellationToken::new()).await?;
//!     session.disconnect(Duration::from_secs(30)).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod probe;
pub mod run;
pub mod session;
pub mod soap;
pub mod transport;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use config::{ClientConfig, PollPolicy};
pub use error::ClientError;
pub use http::{HttpConnector, HttpTransport};
pub use run::{RunController, WaitOutcome};
pub use session::{CallOutcome, Session};
pub use soap::{SoapEnvelope, SoapError};
pub use transport::{Connector, Method, Request, Response, Transport};
pub use workspace::WorkspaceController;
