//! Status snapshots reported by the runner, and the run lifecycle phase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Job name the runner reports while executing a test run.
pub const TESTRUN_JOB_NAME: &str = "TestRun";

/// Snapshot of the runner's status.
///
/// Produced fresh on every poll. Only `job_name` and `job_running` are
/// interpreted; everything else the runner sends is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    /// Name of the job the runner is working on, if any.
    #[serde(default)]
    pub job_name: Option<String>,

    /// Whether that job is still running. `None` when the runner left the
    /// flag out, which says nothing about the job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_running: Option<bool>,

    /// Additional status fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunStatus {
    /// Create a status snapshot with no extra fields.
    pub fn new(job_name: impl Into<String>, job_running: bool) -> Self {
        Self {
            job_name: Some(job_name.into()),
            job_running: Some(job_running),
            extra: Map::new(),
        }
    }

    /// Returns true if the reported job is `expected`, ignoring case.
    pub fn is_job(&self, expected: &str) -> bool {
        self.job_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(expected))
    }

    /// Returns true only if the runner explicitly reported the job stopped.
    pub fn reports_stopped(&self) -> bool {
        self.job_running == Some(false)
    }
}

/// Where a run is in its lifecycle, as observed by polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// The runner has not yet reported the expected job.
    #[default]
    AwaitingDetection,
    /// The expected job has been seen.
    Running,
    /// The job has stopped running.
    Done,
}

impl RunPhase {
    /// Apply one status snapshot.
    ///
    /// Detection and completion never happen on the same snapshot: the
    /// running flag is only looked at once the job has been detected. A
    /// snapshot without the flag leaves a running job running.
    pub fn advance(self, status: &RunStatus, expected_job: &str) -> Self {
        match self {
            Self::AwaitingDetection if status.is_job(expected_job) => Self::Running,
            Self::Running if status.reports_stopped() => Self::Done,
            phase => phase,
        }
    }

    /// Returns true if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}
