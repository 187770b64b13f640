//! # channel-clone
//!
//! Copies the message history of one channel into another, on behalf of
//! many users, one job per user at a time.
//!
//! ## Design Philosophy
//!
//! channel-clone is designed to be:
//! - **Resumable** - Every processed message id is appended to a durable log
//! - **Controllable** - Jobs stop at the next message boundary when asked
//! - **Observable** - Status lines are persisted, pushed to the user and broadcast as events
//! - **Library-first** - The messaging platform is a trait, embedders bring the session
//!
//! ## Quick Start
//!
//! ```no_run
//! use channel_clone::{ChannelCloner, Config, InMemoryPlatform, UserId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = InMemoryPlatform::new();
//!     let cloner = ChannelCloner::new(Config::default(), Arc::new(platform)).await?;
//!
//!     // Subscribe to events
//!     let mut events = cloner.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Clone messages 100..=200 for user 42, reporting to chat 42
//!     let range = channel_clone::CloneRange::new(100, 200);
//!     let handle = cloner.start_clone(UserId(42), 42, Some(range)).await?;
//!     let outcome = handle.wait().await?;
//!     println!("Finished: {:?}", outcome.state);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API server
pub mod api;
/// Messaging platform seam and the in-memory platform
pub mod client;
/// Clone jobs and their control surface
pub mod cloner;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Status notifications
pub mod notify;
/// Durable per-user storage
pub mod storage;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use client::{ChannelHandle, ClientConnector, InMemoryPlatform, MessagingClient};
pub use cloner::{ChannelCloner, JobHandle};
pub use config::{ChannelRef, Config, UserConfig};
pub use error::{ApiError, ClientError, Error, ErrorDetail, JobError, Result, ToHttpStatus};
pub use notify::{NoOpNotifier, Notifier, TelegramNotifier};
pub use storage::UserStore;
pub use types::{
    ChatId, CloneRange, Event, JobInfo, JobOutcome, JobState, MediaRef, MessageId,
    MessageSnapshot, Progress, StatusSnapshot, UserId,
};

/// Helper function to run the cloner with graceful signal handling.
///
/// Waits for a termination signal and then calls the cloner's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use channel_clone::{ChannelCloner, Config, InMemoryPlatform, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cloner = ChannelCloner::new(Config::default(), Arc::new(InMemoryPlatform::new())).await?;
///     let _api = cloner.spawn_api_server();
///
///     // Run with automatic signal handling
///     run_with_shutdown(cloner).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(cloner: ChannelCloner) -> Result<()> {
    wait_for_signal().await;
    cloner.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
