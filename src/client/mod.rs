//! Messaging platform seam
//!
//! The clone pipeline never talks to the platform directly. A
//! [`ClientConnector`] opens one [`MessagingClient`] session per job, and the
//! job releases it with [`MessagingClient::disconnect`] on every exit path.
//!
//! [`InMemoryPlatform`] implements both traits over an in-process channel store
//! and is what embedders use when wiring the cloner without a live account.

use crate::config::UserConfig;
use crate::error::ClientError;
use crate::types::{MediaRef, MessageId, MessageSnapshot, UserId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

mod memory;

pub use memory::{InMemoryPlatform, SentItem};

/// Result type for messaging client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// A channel the session has resolved and may read from or post to
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    /// Normalized (`-100`-prefixed) peer id
    pub id: i64,
    /// Display title, when the platform reports one
    pub title: Option<String>,
}

impl ChannelHandle {
    /// Handle without a title
    pub fn new(id: i64) -> Self {
        Self { id, title: None }
    }
}

/// An authenticated session on the messaging platform
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Look up a channel by its normalized id
    async fn resolve(&self, channel_id: i64) -> ClientResult<ChannelHandle>;

    /// One page of history, newest first
    ///
    /// Returns up to `limit` messages with ids strictly below `offset_id`.
    /// An `offset_id` of 0 starts from the newest message. An empty page means
    /// the beginning of the channel was reached.
    async fn fetch_history(
        &self,
        channel: &ChannelHandle,
        offset_id: MessageId,
        limit: usize,
    ) -> ClientResult<Vec<MessageSnapshot>>;

    /// Download a media attachment into `dest_dir`, returning the written file
    async fn download(&self, media: &MediaRef, dest_dir: &Path) -> ClientResult<PathBuf>;

    /// Post a text message
    async fn send_text(&self, channel: &ChannelHandle, text: &str) -> ClientResult<()>;

    /// Upload a local file with a caption (possibly empty)
    async fn send_file(
        &self,
        channel: &ChannelHandle,
        path: &Path,
        caption: &str,
    ) -> ClientResult<()>;

    /// Release the session. Never fails; problems are only logged.
    async fn disconnect(&self);
}

/// Opens per-user sessions
#[async_trait]
pub trait ClientConnector: Send + Sync {
    /// Connect and authorize with the user's credentials
    ///
    /// `session_path` is where the platform library keeps the login session
    /// for this user; the connector reuses it across jobs.
    async fn connect(
        &self,
        user: UserId,
        config: &UserConfig,
        session_path: &Path,
    ) -> ClientResult<Box<dyn MessagingClient>>;
}
