//! examrun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Runtime specifics
//!
//! Everything here describes what the test runner reports and what a run
//! is started with. Talking to the runner lives in `examrun-client`.

pub mod error;
pub mod model;
pub mod status;

// Re-export commonly used types
pub use error::CoreError;
pub use model::{ModelConfig, RunConfiguration, TestrunFilter, DEFAULT_TARGET_ENDPOINT};
pub use status::{RunPhase, RunStatus, TESTRUN_JOB_NAME};
