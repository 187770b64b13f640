//! Shared test helpers for creating ChannelCloner instances in tests.

use crate::client::{
    ChannelHandle, ClientConnector, ClientResult, InMemoryPlatform, MessagingClient,
};
use crate::cloner::ChannelCloner;
use crate::config::{ChannelRef, Config, UserConfig};
use crate::error::{ClientError, Error, Result};
use crate::notify::Notifier;
use crate::storage::StoreFile;
use crate::types::{ChatId, Event, MediaRef, MessageId, MessageSnapshot, UserId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Source channel id as configured by the front-end
pub(crate) const SOURCE_ID: i64 = 1000;
/// Target channel id as configured by the front-end
pub(crate) const TARGET_ID: i64 = 2000;
/// `SOURCE_ID` after normalization
pub(crate) const SOURCE_PEER: i64 = -1001000;
/// `TARGET_ID` after normalization
pub(crate) const TARGET_PEER: i64 = -1002000;

pub(crate) const USER: UserId = UserId(42);
pub(crate) const CHAT: ChatId = 4242;

/// Notifier that records every delivered text
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<(ChatId, String)>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub(crate) fn texts(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(crate) fn chats(&self) -> Vec<ChatId> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(chat, _)| *chat)
            .collect()
    }

    /// Make every following delivery fail
    pub(crate) fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, chat_id: ChatId, text: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Notification("bot was blocked".to_string()));
        }
        self.messages
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        Ok(())
    }
}

type Hook = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Default)]
struct Faults {
    refuse_connect: Option<String>,
    failing_texts: HashSet<String>,
    failing_media: HashSet<String>,
    failing_uploads: HashSet<String>,
    history_fails_at_page: Option<usize>,
    pages_served: usize,
    sends: usize,
    on_send: Option<Hook>,
    on_page: Option<Hook>,
}

/// [`InMemoryPlatform`] with scripted failures and hooks
///
/// Seeding and inspection go through `Deref` to the wrapped platform.
#[derive(Clone, Default)]
pub(crate) struct ScriptedPlatform {
    inner: InMemoryPlatform,
    faults: Arc<Mutex<Faults>>,
}

impl Deref for ScriptedPlatform {
    type Target = InMemoryPlatform;

    fn deref(&self) -> &InMemoryPlatform {
        &self.inner
    }
}

impl ScriptedPlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every connection attempt fail with `reason`
    pub(crate) fn refuse_connections(&self, reason: impl Into<String>) {
        self.faults.lock().unwrap().refuse_connect = Some(reason.into());
    }

    /// Make every `send_text` with exactly this text fail
    pub(crate) fn fail_text(&self, text: impl Into<String>) {
        self.faults.lock().unwrap().failing_texts.insert(text.into());
    }

    /// Make downloads of this media id fail
    pub(crate) fn fail_media(&self, media_id: impl Into<String>) {
        self.faults.lock().unwrap().failing_media.insert(media_id.into());
    }

    /// Make uploads of a file with this name fail after the file is read
    pub(crate) fn fail_upload(&self, file_name: impl Into<String>) {
        self.faults
            .lock()
            .unwrap()
            .failing_uploads
            .insert(file_name.into());
    }

    /// Make the n-th history request (0-based, counted across sessions) fail
    pub(crate) fn fail_history_at_page(&self, page: usize) {
        self.faults.lock().unwrap().history_fails_at_page = Some(page);
    }

    /// Run `hook` after every successful send with the running send count
    pub(crate) fn on_send(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        self.faults.lock().unwrap().on_send = Some(Arc::new(hook));
    }

    /// Run `hook` after every served history page with its 0-based index
    pub(crate) fn on_history_page(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
        self.faults.lock().unwrap().on_page = Some(Arc::new(hook));
    }
}

#[async_trait]
impl ClientConnector for ScriptedPlatform {
    async fn connect(
        &self,
        user: UserId,
        config: &UserConfig,
        session_path: &Path,
    ) -> ClientResult<Box<dyn MessagingClient>> {
        let refused = self.faults.lock().unwrap().refuse_connect.clone();
        if let Some(reason) = refused {
            return Err(ClientError::Connect(reason));
        }
        let inner = self.inner.connect(user, config, session_path).await?;
        Ok(Box::new(ScriptedSession {
            inner,
            faults: self.faults.clone(),
        }))
    }
}

struct ScriptedSession {
    inner: Box<dyn MessagingClient>,
    faults: Arc<Mutex<Faults>>,
}

impl ScriptedSession {
    fn after_send(&self) {
        let (count, hook) = {
            let mut faults = self.faults.lock().unwrap();
            faults.sends += 1;
            (faults.sends, faults.on_send.clone())
        };
        if let Some(hook) = hook {
            hook(count);
        }
    }
}

#[async_trait]
impl MessagingClient for ScriptedSession {
    async fn resolve(&self, channel_id: i64) -> ClientResult<ChannelHandle> {
        self.inner.resolve(channel_id).await
    }

    async fn fetch_history(
        &self,
        channel: &ChannelHandle,
        offset_id: MessageId,
        limit: usize,
    ) -> ClientResult<Vec<MessageSnapshot>> {
        let (page, failing, hook) = {
            let mut faults = self.faults.lock().unwrap();
            let page = faults.pages_served;
            faults.pages_served += 1;
            (
                page,
                faults.history_fails_at_page == Some(page),
                faults.on_page.clone(),
            )
        };
        if failing {
            return Err(ClientError::History(format!("page {page} unavailable")));
        }

        let messages = self.inner.fetch_history(channel, offset_id, limit).await?;
        if let Some(hook) = hook {
            hook(page);
        }
        Ok(messages)
    }

    async fn download(&self, media: &MediaRef, dest_dir: &Path) -> ClientResult<PathBuf> {
        let failing = self.faults.lock().unwrap().failing_media.contains(&media.id);
        if failing {
            return Err(ClientError::Download(format!("media {} expired", media.id)));
        }
        self.inner.download(media, dest_dir).await
    }

    async fn send_text(&self, channel: &ChannelHandle, text: &str) -> ClientResult<()> {
        let failing = self.faults.lock().unwrap().failing_texts.contains(text);
        if failing {
            return Err(ClientError::Send(format!("rejected message '{text}'")));
        }
        self.inner.send_text(channel, text).await?;
        self.after_send();
        Ok(())
    }

    async fn send_file(
        &self,
        channel: &ChannelHandle,
        path: &Path,
        caption: &str,
    ) -> ClientResult<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let failing = self
            .faults
            .lock()
            .unwrap()
            .failing_uploads
            .contains(&file_name);
        if failing {
            // The upload got as far as reading the file.
            tokio::fs::metadata(path).await?;
            return Err(ClientError::Send(format!("upload of {file_name} was reset")));
        }
        self.inner.send_file(channel, path, caption).await?;
        self.after_send();
        Ok(())
    }

    async fn disconnect(&self) {
        self.inner.disconnect().await
    }
}

pub(crate) struct TestCloner {
    pub(crate) cloner: ChannelCloner,
    pub(crate) platform: ScriptedPlatform,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) _temp_dir: TempDir,
}

/// Cloner over an in-memory platform with no send delay.
/// The returned struct owns the tempdir, which must be kept alive.
pub(crate) async fn create_test_cloner() -> TestCloner {
    create_test_cloner_with(|_| {}).await
}

/// Like [`create_test_cloner`], with a chance to adjust the config first
pub(crate) async fn create_test_cloner_with(adjust: impl FnOnce(&mut Config)) -> TestCloner {
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.storage.data_dir = temp_dir.path().join("user_data");
    config.storage.scratch_dir = temp_dir.path().join("media");
    config.cloning.send_delay = Duration::ZERO;
    adjust(&mut config);

    let platform = ScriptedPlatform::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let cloner =
        ChannelCloner::with_notifier(config, Arc::new(platform.clone()), notifier.clone())
            .await
            .unwrap();

    TestCloner {
        cloner,
        platform,
        notifier,
        _temp_dir: temp_dir,
    }
}

impl TestCloner {
    /// Write a complete user config pointing at the standard channels
    pub(crate) fn configure_user(&self, user: UserId) {
        self.write_user_config(
            user,
            &UserConfig {
                api_id: Some(123456),
                api_hash: Some("0123456789abcdef".to_string()),
                phone: Some("+15550000000".to_string()),
                source_channel_id: Some(ChannelRef::Id(SOURCE_ID)),
                target_channel_id: Some(ChannelRef::Text(TARGET_ID.to_string())),
            },
        );
    }

    pub(crate) fn write_user_config(&self, user: UserId, config: &UserConfig) {
        let path = self.cloner.store().path_for(user, StoreFile::Config);
        std::fs::write(path, serde_json::to_vec(config).unwrap()).unwrap();
    }

    /// Source channel with text messages `"msg {id}"` for `ids`, plus an empty target
    pub(crate) fn seed_text_channel(&self, ids: impl IntoIterator<Item = i64>) {
        self.platform.add_channel(
            SOURCE_PEER,
            ids.into_iter()
                .map(|id| MessageSnapshot::text(id, format!("msg {id}"))),
        );
        self.platform.add_channel(TARGET_PEER, []);
    }

    /// Texts posted to the target channel, in order
    pub(crate) fn sent_texts(&self) -> Vec<String> {
        self.platform
            .sent()
            .into_iter()
            .filter_map(|item| match item {
                crate::client::SentItem::Text { text, .. } => Some(text),
                crate::client::SentItem::File { .. } => None,
            })
            .collect()
    }

    pub(crate) fn read_file(&self, user: UserId, kind: StoreFile) -> Option<String> {
        std::fs::read_to_string(self.cloner.store().path_for(user, kind)).ok()
    }

    pub(crate) fn file_exists(&self, user: UserId, kind: StoreFile) -> bool {
        self.cloner.store().path_for(user, kind).exists()
    }
}

/// `done` values of every "Cloning: x% complete" notification
pub(crate) fn cloning_checkpoints(texts: &[String]) -> Vec<u64> {
    texts
        .iter()
        .filter(|text| text.contains("⏳ Cloning:"))
        .filter_map(|text| {
            let start = text.find('(')? + 1;
            let end = text[start..].find('/')? + start;
            text[start..end].parse().ok()
        })
        .collect()
}

/// Wait for the first event matching `pred`, failing the test after 5 seconds
pub(crate) async fn wait_for_event(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    mut pred: impl FnMut(&Event) -> bool,
) -> Event {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
