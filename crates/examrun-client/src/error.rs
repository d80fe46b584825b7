//! Error types for the runner client.

use thiserror::Error;

use crate::soap::SoapError;

/// Errors that can occur when talking to the runner.
///
/// A missing session is not an error; see [`crate::CallOutcome`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The runner answered a checked call with a non-success status.
    #[error("HTTP error code {status}: {path}")]
    Remote { status: u16, path: String },

    /// An HTTP call could not be completed (refused, timed out, reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-HTTP transport could not complete the call.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Serialization of a request body failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A SOAP envelope could not be extracted or parsed.
    #[error("SOAP error: {0}")]
    Soap(#[from] SoapError),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns true if the runner answered with a non-success status.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns true if the call never got an answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let remote = ClientError::Remote {
            status: 500,
            path: "/testrun/start".to_string(),
        };
        assert!(remote.is_remote());
        assert!(!remote.is_transport());
        assert_eq!(remote.to_string(), "HTTP error code 500: /testrun/start");

        assert!(ClientError::Transport("refused".to_string()).is_transport());
    }

    #[test]
    fn test_soap_errors_convert() {
        let err: ClientError = SoapError::MissingBody.into();
        assert!(matches!(err, ClientError::Soap(SoapError::MissingBody)));
    }
}
