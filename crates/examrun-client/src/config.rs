//! Client configuration.

use std::time::Duration;

use examrun_core::TESTRUN_JOB_NAME;

use crate::error::ClientError;

/// How often the client polls the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between availability probes while connecting or disconnecting.
    ///
    /// Zero polls in a tight loop. The pause never extends past the
    /// caller's deadline.
    pub probe_interval: Duration,

    /// Pause between status polls while waiting for a run to finish.
    pub status_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_millis(100),
            status_interval: Duration::from_secs(5),
        }
    }
}

/// Runner client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the runner's REST interface.
    pub base_url: String,

    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,

    /// Polling intervals.
    pub poll: PollPolicy,

    /// Grace period the runner gets to stop a run (seconds, server side).
    pub stop_timeout_secs: u64,

    /// Job name that identifies our run in status reports.
    pub expected_job: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8085/examRest".to_string(),
            request_timeout: Duration::from_secs(30),
            poll: PollPolicy::default(),
            stop_timeout_secs: 300,
            expected_job: TESTRUN_JOB_NAME.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a config for the runner at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Builder method to set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder method to set the polling policy.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Builder method to set the server-side stop grace period.
    pub fn with_stop_timeout_secs(mut self, secs: u64) -> Self {
        self.stop_timeout_secs = secs;
        self
    }

    /// Builder method to set the job name to wait for.
    pub fn with_expected_job(mut self, job: impl Into<String>) -> Self {
        self.expected_job = job.into();
        self
    }

    /// Check the configuration before opening a session.
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.expected_job.trim().is_empty() {
            return Err(ClientError::Config("expected job name is empty".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.stop_timeout_secs, 300);
        assert_eq!(config.expected_job, "TestRun");
        assert_eq!(config.poll.status_interval, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = ClientConfig::new("http://runner:8085/examRest/");
        assert_eq!(config.base_url, "http://runner:8085/examRest");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(matches!(
            ClientConfig::new("runner:8085").validate(),
            Err(ClientError::Config(_))
        ));
        assert!(ClientConfig::default()
            .with_expected_job(" ")
            .validate()
            .is_err());
        assert!(ClientConfig::default()
            .with_request_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
