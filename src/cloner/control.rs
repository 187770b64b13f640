//! Job control: start, resume, stop and status queries.

use crate::error::{Error, JobError, Result};
use crate::storage::Marker;
use crate::types::{ChatId, CloneRange, Event, JobInfo, Progress, StatusSnapshot, UserId};
use crate::utils::{format_notification, status_timestamp};
use std::sync::atomic::Ordering;

use super::ChannelCloner;
use super::job::{JobContext, JobHandle, Reporter, StopSignal, run_clone_job};

impl ChannelCloner {
    /// Start a clone job for `user`
    ///
    /// The job copies the user's configured source channel into the target
    /// channel, optionally restricted to an inclusive id range, and reports
    /// progress to `chat`. It runs on its own task; the returned handle can
    /// be awaited for the terminal outcome.
    ///
    /// Before the job is launched the Start marker is written and any stale
    /// Stop marker left by an earlier request is cleared.
    ///
    /// # Arguments
    ///
    /// * `user` - Owner of the job and of the per-user configuration
    /// * `chat` - Chat receiving status notifications
    /// * `range` - Inclusive message-id interval, or `None` for the whole history
    ///
    /// # Errors
    ///
    /// - [`JobError::AlreadyRunning`] if the user has an active job. The user
    ///   is notified and no persisted state is touched.
    /// - [`Error::ShuttingDown`] once shutdown has begun.
    /// - Storage errors while preparing the control markers.
    ///
    /// Initialization and channel failures are not errors here: the job
    /// starts and ends as `Failed`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use channel_clone::*;
    /// # async fn example(cloner: ChannelCloner) -> Result<()> {
    /// let handle = cloner
    ///     .start_clone(UserId(42), 42, Some(CloneRange::new(100, 200)))
    ///     .await?;
    /// let outcome = handle.wait().await?;
    /// println!("{:?}: {}", outcome.state, outcome.progress);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_clone(
        &self,
        user: UserId,
        chat: ChatId,
        range: Option<CloneRange>,
    ) -> Result<JobHandle> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let Some(stop) = self.registry.try_register(user, range).await else {
            tracing::info!(user_id = %user, "Rejecting clone request, job already running");
            self.notify_already_running(user, chat).await;
            return Err(JobError::AlreadyRunning { user_id: user.get() }.into());
        };

        if let Err(e) = self.prepare_markers(user).await {
            self.registry.remove(user).await;
            return Err(e);
        }

        let ctx = JobContext {
            user,
            range,
            config: self.config.clone(),
            store: self.store.clone(),
            connector: self.connector.clone(),
            registry: self.registry.clone(),
            event_tx: self.event_tx.clone(),
            stop: StopSignal::new(user, self.store.clone(), stop),
        };
        let reporter = Reporter::new(
            user,
            chat,
            self.store.clone(),
            self.notifier.clone(),
            self.registry.clone(),
            self.event_tx.clone(),
        );

        self.emit_event(Event::JobStarted {
            user_id: user,
            range,
        });
        let task = tokio::spawn(run_clone_job(ctx, reporter));
        Ok(JobHandle::new(user, range, task))
    }

    /// Continue after the last message recorded in the user's sent log
    ///
    /// Starts a clone of every message with an id greater than the last
    /// logged one.
    ///
    /// # Errors
    ///
    /// - [`JobError::NothingToResume`] if the sent log is absent or empty; the
    ///   user is notified and no job is started.
    /// - [`Error::Storage`] if the last log entry is malformed.
    /// - Any error of [`ChannelCloner::start_clone`].
    pub async fn resume(&self, user: UserId, chat: ChatId) -> Result<JobHandle> {
        let Some(last) = self.store.last_sent_id(user).await? else {
            tracing::info!(user_id = %user, "Nothing to resume");
            self.notify_direct(
                user,
                chat,
                "⚠️ No previous clone operation to resume",
                Progress::default(),
            )
            .await;
            return Err(JobError::NothingToResume { user_id: user.get() }.into());
        };

        let start = last.saturating_add(1);
        tracing::info!(user_id = %user, start_id = start, "Resuming clone");
        self.start_clone(user, chat, Some(CloneRange::starting_at(start)))
            .await
    }

    /// Ask the user's job to stop
    ///
    /// A job running in this process gets the request directly. During
    /// collection it ends the history walk and the messages gathered so far
    /// are still cloned. During replication the job stops before the next
    /// message and a pending send delay is cut short. Otherwise the durable
    /// Stop marker is written for a job running elsewhere; the next start
    /// in this process clears it. Returns whether a local job was signalled.
    pub async fn stop(&self, user: UserId) -> Result<bool> {
        let signalled = self.registry.request_stop(user).await;
        if !signalled {
            self.store.set_marker(user, Marker::Stop).await?;
        }
        tracing::info!(user_id = %user, signalled, "Stop requested");
        Ok(signalled)
    }

    /// Live view of the user's job, or an idle view when none is running
    pub async fn job_status(&self, user: UserId) -> JobInfo {
        self.registry
            .info(user)
            .await
            .unwrap_or_else(|| JobInfo::idle(user))
    }

    /// Last persisted status snapshot, if the user ever ran a job
    pub async fn persisted_status(&self, user: UserId) -> Result<Option<StatusSnapshot>> {
        self.store.read_status(user).await
    }

    async fn prepare_markers(&self, user: UserId) -> Result<()> {
        if self.store.take_marker(user, Marker::Stop).await? {
            tracing::debug!(user_id = %user, "Cleared stale stop marker");
        }
        self.store.set_marker(user, Marker::Start).await
    }

    async fn notify_already_running(&self, user: UserId, chat: ChatId) {
        let progress = self.job_status(user).await.progress;
        self.notify_direct(
            user,
            chat,
            "❌ Already running a clone operation",
            progress,
        )
        .await;
    }

    /// Notify without touching persisted status
    async fn notify_direct(
        &self,
        user: UserId,
        chat: ChatId,
        message: &str,
        progress: Progress,
    ) {
        let text = format_notification(message, &status_timestamp(), progress);
        if let Err(e) = self.notifier.notify(chat, &text).await {
            tracing::warn!(user_id = %user, error = %e, "Failed to notify user");
        }
    }
}
