//! Channel cloner: per-user clone jobs and their control surface.
//!
//! The `ChannelCloner` struct and its methods are organized by concern:
//! - [`control`] - Start, resume and stop requests, status queries
//! - [`lifecycle`] - Graceful shutdown
//! - [`registry`] - Active job bookkeeping (one job per user)
//! - [`job`] - Execution of a single clone job

mod control;
mod job;
mod lifecycle;
mod registry;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use job::JobHandle;

use crate::client::ClientConnector;
use crate::config::Config;
use crate::error::Result;
use crate::notify::{self, Notifier};
use crate::storage::UserStore;
use registry::JobRegistry;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Main cloner instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ChannelCloner {
    /// Configuration (wrapped in Arc for sharing across jobs)
    pub(crate) config: Arc<Config>,
    /// Durable per-user state
    pub(crate) store: UserStore,
    /// Opens a messaging session for each job
    pub(crate) connector: Arc<dyn ClientConnector>,
    /// Delivers status lines to users
    pub(crate) notifier: Arc<dyn Notifier>,
    /// Jobs that have not reached a terminal state
    pub(crate) registry: JobRegistry,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<crate::types::Event>,
    /// Cleared during shutdown so no new job is admitted
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl ChannelCloner {
    /// Create a cloner with the notifier described by `config.notifications`
    ///
    /// This validates the configuration, creates the data and scratch
    /// directories and sets up the event broadcast channel.
    pub async fn new(config: Config, connector: Arc<dyn ClientConnector>) -> Result<Self> {
        let notifier = notify::from_config(&config.notifications)?;
        Self::with_notifier(config, connector, notifier).await
    }

    /// Create a cloner with an explicit notifier
    pub async fn with_notifier(
        config: Config,
        connector: Arc<dyn ClientConnector>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;

        let store = UserStore::open(&config.storage.data_dir).await?;
        tokio::fs::create_dir_all(&config.storage.scratch_dir)
            .await
            .map_err(|e| {
                crate::error::Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create scratch directory '{}': {}",
                        config.storage.scratch_dir.display(),
                        e
                    ),
                ))
            })?;

        // Buffer of 1000 events so slow subscribers rarely lag
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        tracing::info!(data_dir = %config.storage.data_dir.display(), "Channel cloner ready");

        Ok(Self {
            config: Arc::new(config),
            store,
            connector,
            notifier,
            registry: JobRegistry::default(),
            event_tx,
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Subscribe to job events
    ///
    /// Each subscriber receives every event emitted after it subscribed.
    /// Slow subscribers may miss events once the 1000-event buffer overflows.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<crate::types::Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Per-user storage backing this cloner
    pub fn store(&self) -> &UserStore {
        &self.store
    }

    /// Emit an event to all subscribers
    pub(crate) fn emit_event(&self, event: crate::types::Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server listens on `config.api.bind_address` (default: 127.0.0.1:6790).
    pub fn spawn_api_server(&self) -> tokio::task::JoinHandle<Result<()>> {
        let cloner = Arc::new(self.clone());
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(cloner, config).await })
    }
}
