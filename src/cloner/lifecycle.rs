//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::ChannelCloner;

/// Upper bound on how long shutdown waits for jobs to wind down
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl ChannelCloner {
    /// Gracefully shut down the cloner
    ///
    /// 1. Stops accepting new jobs (`start_clone` returns [`crate::Error::ShuttingDown`])
    /// 2. Cancels every active job's token; each job stops at its next check point
    /// 3. Waits up to 30 seconds for the jobs to reach a terminal state
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Durable Stop markers are not written, so a job interrupted here can be
    /// continued later with [`ChannelCloner::resume`].
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        let signalled = self.registry.cancel_all().await;
        tracing::info!(active_jobs = signalled, "Signaled stop to all active jobs");

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_jobs()).await {
            Ok(()) => tracing::info!("All active jobs finished"),
            Err(_) => {
                tracing::warn!("Timeout waiting for jobs to finish, proceeding with shutdown")
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    async fn wait_for_active_jobs(&self) {
        loop {
            let active_count = self.registry.len().await;
            if active_count == 0 {
                return;
            }

            tracing::debug!(active_count, "Waiting for active jobs to finish");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
