//! Status and progress reporting.
//!
//! Every update is persisted as the user's status snapshot, mirrored into the
//! registry, broadcast as an event and pushed to the user's chat. Write and
//! delivery failures go to the user's error log and never fail the job.

use crate::notify::Notifier;
use crate::storage::UserStore;
use crate::types::{ChatId, Event, JobState, Progress, StatusSnapshot, UserId};
use crate::utils::{format_notification, status_timestamp};
use std::sync::Arc;

use super::super::registry::JobRegistry;

pub(crate) struct Reporter {
    user: UserId,
    chat: ChatId,
    store: UserStore,
    notifier: Arc<dyn Notifier>,
    registry: JobRegistry,
    event_tx: tokio::sync::broadcast::Sender<Event>,
    state: JobState,
    progress: Progress,
}

impl Reporter {
    pub(crate) fn new(
        user: UserId,
        chat: ChatId,
        store: UserStore,
        notifier: Arc<dyn Notifier>,
        registry: JobRegistry,
        event_tx: tokio::sync::broadcast::Sender<Event>,
    ) -> Self {
        Self {
            user,
            chat,
            store,
            notifier,
            registry,
            event_tx,
            state: JobState::Collecting,
            progress: Progress::default(),
        }
    }

    pub(crate) fn state(&self) -> JobState {
        self.state
    }

    pub(crate) fn progress(&self) -> Progress {
        self.progress
    }

    pub(crate) async fn set_state(&mut self, state: JobState) {
        self.state = state;
        self.registry
            .update(self.user, |info| {
                info.state = state;
                info.is_running = state.is_running();
            })
            .await;
    }

    /// Reset progress to `0/total` once the selection is known
    pub(crate) async fn set_total(&mut self, total: u64) {
        self.progress = Progress::new(total);
        let progress = self.progress;
        self.registry
            .update(self.user, |info| info.progress = progress)
            .await;
    }

    /// Count one processed item
    pub(crate) async fn advance(&mut self) -> Progress {
        self.progress.advance();
        let progress = self.progress;
        self.registry
            .update(self.user, |info| info.progress = progress)
            .await;
        progress
    }

    /// Publish a new status line
    pub(crate) async fn update(&mut self, message: impl Into<String>) {
        let message = message.into();
        let timestamp = status_timestamp();
        tracing::debug!(user_id = %self.user, progress = %self.progress, "{message}");

        let snapshot = StatusSnapshot {
            message: message.clone(),
            timestamp: timestamp.clone(),
            progress: self.progress.as_pair(),
        };
        if let Err(e) = self.store.write_status(self.user, &snapshot).await {
            tracing::warn!(user_id = %self.user, error = %e, "Failed to persist status");
            self.log_error(&format!("Status update failed: {e}")).await;
        }

        let (state, progress) = (self.state, self.progress);
        self.registry
            .update(self.user, |info| {
                info.last_status = Some(message.clone());
                info.last_update = Some(timestamp.clone());
            })
            .await;
        self.event_tx
            .send(Event::StatusChanged {
                user_id: self.user,
                state,
                message: message.clone(),
                progress,
            })
            .ok();

        let text = format_notification(&message, &timestamp, progress);
        if let Err(e) = self.notifier.notify(self.chat, &text).await {
            tracing::warn!(user_id = %self.user, error = %e, "Failed to notify user");
            self.log_error(&format!("Status update failed: {e}")).await;
        }
    }

    async fn log_error(&self, message: &str) {
        if let Err(e) = self.store.append_error(self.user, message).await {
            tracing::warn!(user_id = %self.user, error = %e, "Failed to write error log");
        }
    }
}
