//! Job context: everything a single clone job needs, plus its stop signal.

use crate::client::ClientConnector;
use crate::config::Config;
use crate::storage::{Marker, UserStore};
use crate::types::{CloneRange, Event, UserId};
use std::path::PathBuf;
use std::sync::Arc;

use super::super::registry::{JobRegistry, StopRequests};

/// Cooperative stop request for one job
///
/// Raised either in-process through the registry or by any writer of the
/// user's durable Stop marker. [`StopSignal::take`] observes both and clears
/// what it saw, so a request is consumed exactly once. Shutdown is the
/// exception: once the job is cancelled every check reports a stop.
#[derive(Clone)]
pub(crate) struct StopSignal {
    user: UserId,
    store: UserStore,
    requests: StopRequests,
}

impl StopSignal {
    pub(crate) fn new(user: UserId, store: UserStore, requests: StopRequests) -> Self {
        Self {
            user,
            store,
            requests,
        }
    }

    /// Check for a pending stop request and consume it
    pub(crate) async fn take(&self) -> bool {
        let marker = match self.store.take_marker(self.user, Marker::Stop).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(user_id = %self.user, error = %e, "Failed to check stop marker");
                false
            }
        };
        let requested = self.requests.consume();
        marker || requested
    }

    /// Resolves once an in-process stop is requested
    pub(crate) async fn cancelled(&self) {
        self.requests.cancelled().await
    }
}

/// Shared state for one running clone job
pub(crate) struct JobContext {
    pub(crate) user: UserId,
    pub(crate) range: Option<CloneRange>,
    pub(crate) config: Arc<Config>,
    pub(crate) store: UserStore,
    pub(crate) connector: Arc<dyn ClientConnector>,
    pub(crate) registry: JobRegistry,
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    pub(crate) stop: StopSignal,
}

impl JobContext {
    /// Per-user scratch directory for media in transit
    pub(crate) fn scratch_dir(&self) -> PathBuf {
        self.config
            .storage
            .scratch_dir
            .join(self.user.to_string())
    }

    pub(crate) fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Append to the user's error log; failures only reach tracing
    pub(crate) async fn log_error(&self, message: &str) {
        if let Err(e) = self.store.append_error(self.user, message).await {
            tracing::warn!(user_id = %self.user, error = %e, "Failed to write error log");
        }
    }

    /// Release the user's slot in the registry
    pub(crate) async fn remove_from_active(&self) {
        self.registry.remove(self.user).await;
    }
}
