//! Active job bookkeeping.
//!
//! One entry per user with a non-terminal job. Insertion is the admission
//! check, so two concurrent start requests for the same user can never both
//! succeed. The job removes its own entry once it reaches a terminal state.

use crate::types::{CloneRange, JobInfo, JobState, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// In-process stop requests for one job
///
/// `job` is cancelled at shutdown and stays cancelled. A stop request cancels
/// the current `pending` token, a child of `job`; consuming it swaps in a
/// fresh child, so each request is observed exactly once.
#[derive(Clone)]
pub(crate) struct StopRequests {
    job: CancellationToken,
    pending: Arc<std::sync::Mutex<CancellationToken>>,
}

impl Default for StopRequests {
    fn default() -> Self {
        let job = CancellationToken::new();
        let pending = Arc::new(std::sync::Mutex::new(job.child_token()));
        Self { job, pending }
    }
}

impl StopRequests {
    fn pending(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask the job to stop at its next check point
    pub(crate) fn request_stop(&self) {
        self.pending().cancel();
    }

    /// Stop the job for good
    pub(crate) fn cancel_job(&self) {
        self.job.cancel();
    }

    /// Take a pending request; a cancelled job always reports one
    pub(crate) fn consume(&self) -> bool {
        if self.job.is_cancelled() {
            return true;
        }
        let mut pending = self.pending();
        if pending.is_cancelled() {
            *pending = self.job.child_token();
            true
        } else {
            false
        }
    }

    /// Resolves once a stop is requested or the job is cancelled
    pub(crate) async fn cancelled(&self) {
        let pending = self.pending().clone();
        pending.cancelled().await
    }
}

struct ActiveJob {
    stop: StopRequests,
    info: JobInfo,
}

/// Map of users to their running job
#[derive(Clone, Default)]
pub(crate) struct JobRegistry {
    jobs: Arc<Mutex<HashMap<UserId, ActiveJob>>>,
}

impl JobRegistry {
    /// Claim the user's slot, returning the new job's stop requests
    ///
    /// Returns `None` when the user already has an active job.
    pub(crate) async fn try_register(
        &self,
        user: UserId,
        range: Option<CloneRange>,
    ) -> Option<StopRequests> {
        let mut jobs = self.jobs.lock().await;
        if jobs.contains_key(&user) {
            return None;
        }

        let stop = StopRequests::default();
        let mut info = JobInfo::idle(user);
        info.state = JobState::Collecting;
        info.is_running = true;
        info.range = range;

        jobs.insert(
            user,
            ActiveJob {
                stop: stop.clone(),
                info,
            },
        );
        Some(stop)
    }

    /// Apply `f` to the user's live job info, if the job is still registered
    pub(crate) async fn update(&self, user: UserId, f: impl FnOnce(&mut JobInfo)) {
        if let Some(job) = self.jobs.lock().await.get_mut(&user) {
            f(&mut job.info);
        }
    }

    /// Snapshot of the user's live job info
    pub(crate) async fn info(&self, user: UserId) -> Option<JobInfo> {
        self.jobs.lock().await.get(&user).map(|job| job.info.clone())
    }

    /// Release the user's slot
    pub(crate) async fn remove(&self, user: UserId) {
        self.jobs.lock().await.remove(&user);
    }

    /// Send a stop request to the user's job; returns whether one was registered
    pub(crate) async fn request_stop(&self, user: UserId) -> bool {
        match self.jobs.lock().await.get(&user) {
            Some(job) => {
                job.stop.request_stop();
                true
            }
            None => false,
        }
    }

    /// Cancel every registered job, returning how many were signalled
    pub(crate) async fn cancel_all(&self) -> usize {
        let jobs = self.jobs.lock().await;
        for (user, job) in jobs.iter() {
            tracing::debug!(user_id = %user, "Signaling stop");
            job.stop.cancel_job();
        }
        jobs.len()
    }

    /// Number of registered jobs
    pub(crate) async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }
}
