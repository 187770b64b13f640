//! In-process messaging platform.

use super::{ChannelHandle, ClientConnector, ClientResult, MessagingClient};
use crate::config::UserConfig;
use crate::error::ClientError;
use crate::types::{MediaRef, MessageId, MessageSnapshot, UserId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Something a session posted to a channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SentItem {
    /// A text message
    Text {
        /// Target channel id
        channel: i64,
        /// Message text
        text: String,
    },
    /// An uploaded file
    File {
        /// Target channel id
        channel: i64,
        /// File name as uploaded
        file_name: String,
        /// Caption (empty when the source had none)
        caption: String,
    },
}

#[derive(Default)]
struct PlatformState {
    channels: BTreeMap<i64, Vec<MessageSnapshot>>,
    media: HashMap<String, Vec<u8>>,
    sent: Vec<SentItem>,
    downloads: Vec<PathBuf>,
    connects: usize,
    disconnects: usize,
}

/// Messaging platform kept entirely in memory
///
/// Channels hold message snapshots in id order; media payloads are stored by
/// media id. Every session opened through the [`ClientConnector`] impl shares
/// the same state, so a clone replays exactly what was seeded.
///
/// # Examples
///
/// ```
/// use channel_clone::client::InMemoryPlatform;
/// use channel_clone::types::MessageSnapshot;
///
/// let platform = InMemoryPlatform::new();
/// platform.add_channel(-1001, (1..=3).map(|id| MessageSnapshot::text(id, format!("post {id}"))));
/// platform.add_channel(-1002, []);
/// assert!(platform.sent().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryPlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl InMemoryPlatform {
    /// Empty platform with no channels
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create (or replace) a channel with the given history
    pub fn add_channel(&self, id: i64, messages: impl IntoIterator<Item = MessageSnapshot>) {
        let mut messages: Vec<_> = messages.into_iter().collect();
        messages.sort_by_key(|m| m.id);
        self.state().channels.insert(id, messages);
    }

    /// Register the payload served for a media id
    pub fn add_media(&self, media_id: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.state().media.insert(media_id.into(), bytes.into());
    }

    /// Everything posted so far, in order
    pub fn sent(&self) -> Vec<SentItem> {
        self.state().sent.clone()
    }

    /// Files written by `download`, in order
    pub fn downloads(&self) -> Vec<PathBuf> {
        self.state().downloads.clone()
    }

    /// Number of sessions opened
    pub fn connects(&self) -> usize {
        self.state().connects
    }

    /// Number of sessions released
    pub fn disconnects(&self) -> usize {
        self.state().disconnects
    }

    fn record_send(&self, item: SentItem) {
        self.state().sent.push(item);
    }
}

#[async_trait]
impl ClientConnector for InMemoryPlatform {
    async fn connect(
        &self,
        user: UserId,
        config: &UserConfig,
        session_path: &Path,
    ) -> ClientResult<Box<dyn MessagingClient>> {
        if !config.has_credentials() {
            return Err(ClientError::Unauthorized(format!(
                "session {} is not logged in",
                session_path.display()
            )));
        }
        self.state().connects += 1;
        tracing::debug!(user_id = %user, session = %session_path.display(), "in-memory session opened");

        Ok(Box::new(InMemorySession {
            platform: self.clone(),
        }))
    }
}

struct InMemorySession {
    platform: InMemoryPlatform,
}

#[async_trait]
impl MessagingClient for InMemorySession {
    async fn resolve(&self, channel_id: i64) -> ClientResult<ChannelHandle> {
        if self.platform.state().channels.contains_key(&channel_id) {
            Ok(ChannelHandle::new(channel_id))
        } else {
            Err(ClientError::Resolve {
                channel: channel_id.to_string(),
                reason: "channel not found".to_string(),
            })
        }
    }

    async fn fetch_history(
        &self,
        channel: &ChannelHandle,
        offset_id: MessageId,
        limit: usize,
    ) -> ClientResult<Vec<MessageSnapshot>> {
        let state = self.platform.state();
        let messages = state
            .channels
            .get(&channel.id)
            .ok_or_else(|| ClientError::History(format!("unknown channel {}", channel.id)))?;

        Ok(messages
            .iter()
            .rev()
            .filter(|m| offset_id == 0 || m.id < offset_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn download(&self, media: &MediaRef, dest_dir: &Path) -> ClientResult<PathBuf> {
        let bytes = self
            .platform
            .state()
            .media
            .get(&media.id)
            .cloned()
            .ok_or_else(|| ClientError::Download(format!("unknown media {}", media.id)))?;

        // Only the final component of the platform-supplied name is used.
        let candidate = media.file_name.as_deref().unwrap_or(&media.id);
        let name = Path::new(candidate).file_name().ok_or_else(|| {
            ClientError::Download(format!("media {} has no usable file name", media.id))
        })?;
        let path = dest_dir.join(name);

        tokio::fs::create_dir_all(dest_dir).await?;
        tokio::fs::write(&path, bytes).await?;

        self.platform.state().downloads.push(path.clone());
        Ok(path)
    }

    async fn send_text(&self, channel: &ChannelHandle, text: &str) -> ClientResult<()> {
        self.platform.record_send(SentItem::Text {
            channel: channel.id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_file(
        &self,
        channel: &ChannelHandle,
        path: &Path,
        caption: &str,
    ) -> ClientResult<()> {
        // The upload must see the downloaded file on disk.
        tokio::fs::metadata(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.platform.record_send(SentItem::File {
            channel: channel.id,
            file_name,
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn disconnect(&self) {
        self.platform.state().disconnects += 1;
    }
}
