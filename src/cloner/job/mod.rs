//! Clone job execution: one sequential pipeline per user.
//!
//! Split into focused submodules:
//! - [`context`] - Shared job state and the stop signal
//! - [`orchestration`] - Top-level job lifecycle
//! - [`collect`] - Paginated history collection
//! - [`filter`] - Range selection
//! - [`replicate`] - Per-message transfer with failure isolation
//! - [`scratch`] - Scoped scratch files for media in transit
//! - [`report`] - Status persistence, notification and events

mod collect;
mod context;
mod filter;
mod orchestration;
mod replicate;
mod report;
mod scratch;


pub(crate) use context::{JobContext, StopSignal};
pub(crate) use orchestration::run_clone_job;
pub(crate) use report::Reporter;

use crate::error::{Error, Result};
use crate::types::{CloneRange, JobOutcome, UserId};

/// Handle to a spawned clone job
///
/// Dropping the handle detaches the job; it keeps running to completion.
#[derive(Debug)]
pub struct JobHandle {
    user_id: UserId,
    range: Option<CloneRange>,
    task: tokio::task::JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub(crate) fn new(
        user_id: UserId,
        range: Option<CloneRange>,
        task: tokio::task::JoinHandle<JobOutcome>,
    ) -> Self {
        Self {
            user_id,
            range,
            task,
        }
    }

    /// Owner of the job
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Range the job was started with (`None` for the whole history)
    pub fn range(&self) -> Option<CloneRange> {
        self.range
    }

    /// Whether the job task has finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job to reach a terminal state
    pub async fn wait(self) -> Result<JobOutcome> {
        self.task
            .await
            .map_err(|e| Error::Other(format!("clone job for user {} aborted: {e}", self.user_id)))
    }
}
