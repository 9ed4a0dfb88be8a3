//! Run scheduling.
//!
//! Scheduling is not idempotent: every accepted request creates a new,
//! billable run. [`RunScheduler::schedule_run`] therefore makes exactly one
//! remote call and never retries; whether to resubmit is the caller's call.

use tracing::info;

use crate::client::{ClientError, DeviceFarmClient};
use crate::model::{RunRequest, RunResult};

/// The service refused or failed to schedule the run.
///
/// The remote failure (invalid pool, quota exceeded, malformed request, ...)
/// is carried unchanged as the source.
#[derive(Debug, thiserror::Error)]
#[error("Failed to schedule run '{name}': {source}")]
pub struct SchedulingError {
    pub name: String,
    #[source]
    pub source: ClientError,
}

/// Submits run requests to the service.
pub struct RunScheduler<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C> RunScheduler<'a, C>
where
    C: DeviceFarmClient + ?Sized,
{
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Schedules `request`, returning the created run.
    pub async fn schedule_run(&self, request: &RunRequest) -> Result<RunResult, SchedulingError> {
        info!(
            "Scheduling {} run '{}' on {}",
            request.test.test_type, request.name, request.device_pool_arn
        );

        let result = self
            .client
            .schedule_run(request)
            .await
            .map_err(|source| SchedulingError {
                name: request.name.clone(),
                source,
            })?;

        info!("Scheduled run {}", result.arn());
        Ok(result)
    }
}
