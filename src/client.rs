//! Remote service abstraction.
//!
//! Everything the submission core needs from Device Farm goes through the
//! [`DeviceFarmClient`] trait: listing projects and device pools, creating
//! and inspecting uploads, and scheduling runs. The orchestrator never talks
//! to the service directly, so tests substitute in-memory fakes and
//! production wires in [`cli::AwsCliClient`].
//!
//! ```text
//!  IdentityResolver ──► list_projects / list_device_pools ─┐
//!  DeviceFarmUploader ─► create_upload / get_upload ───────┼──► DeviceFarmClient
//!  RunScheduler ──────► schedule_run ─────────────────────┘
//! ```

pub mod cli;

use async_trait::async_trait;

use crate::model::{DevicePool, Project, RunRequest, RunResult, Upload, UploadKind};

/// Result type for remote client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by a remote client.
///
/// `Service` carries the failure reported by the remote side verbatim;
/// the other variants describe local problems reaching it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service rejected the call (bad ARN, quota exceeded, ...).
    #[error("{operation} failed: {message}")]
    Service { operation: String, message: String },

    /// The transport could not be started.
    #[error("Failed to invoke {operation}: {message}")]
    Exec { operation: String, message: String },

    /// The call did not finish within the configured timeout.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// The service answered with something that is not the expected JSON.
    #[error("Failed to parse {operation} response: {source}")]
    Parse {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Capability interface over the remote device-testing service.
///
/// Listing calls are read-only and safe to repeat. `schedule_run` is not
/// idempotent: every successful call creates a new, billable run.
#[async_trait]
pub trait DeviceFarmClient: Send + Sync {
    /// Lists every project visible to the caller, unfiltered.
    async fn list_projects(&self) -> ClientResult<Vec<Project>>;

    /// Lists every device pool under a project, unfiltered.
    async fn list_device_pools(&self, project_arn: &str) -> ClientResult<Vec<DevicePool>>;

    /// Registers a new upload and returns it with a pre-signed transfer URL.
    async fn create_upload(
        &self,
        project_arn: &str,
        name: &str,
        kind: UploadKind,
    ) -> ClientResult<Upload>;

    /// Fetches the current state of an upload.
    async fn get_upload(&self, arn: &str) -> ClientResult<Upload>;

    /// Schedules a run. Called at most once per submission.
    async fn schedule_run(&self, request: &RunRequest) -> ClientResult<RunResult>;

    /// Client name (for logging).
    fn name(&self) -> &str;
}
