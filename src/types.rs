//! Core types for channel-clone

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a user (owner of at most one clone job at a time)
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new UserId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Message identifier, strictly ordered within a channel
pub type MessageId = i64;

/// Chat that receives status notifications for a job
pub type ChatId = i64;

/// Opaque reference to a media attachment, interpreted only by the messaging client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Platform-specific file or document identifier
    pub id: String,
    /// Original file name, when the platform exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl MediaRef {
    /// Create a media reference without a file name
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: None,
        }
    }
}

/// A single channel message as fetched from history. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSnapshot {
    /// Message id within the source channel
    pub id: MessageId,
    /// Message text or media caption
    #[serde(default)]
    pub text: Option<String>,
    /// Attached media, if any
    #[serde(default)]
    pub media: Option<MediaRef>,
}

impl MessageSnapshot {
    /// Text-only message
    pub fn text(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: Some(text.into()),
            media: None,
        }
    }

    /// Media message with an optional caption
    pub fn media(id: MessageId, media: MediaRef, caption: Option<String>) -> Self {
        Self {
            id,
            text: caption,
            media: Some(media),
        }
    }

    /// Message with neither text nor media (service messages, polls, etc.)
    pub fn empty(id: MessageId) -> Self {
        Self {
            id,
            text: None,
            media: None,
        }
    }

    /// Text to forward; empty strings count as no text
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Inclusive message-id interval selected for a clone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CloneRange {
    /// First message id to clone (inclusive)
    #[schema(value_type = i64)]
    pub start_id: MessageId,
    /// Last message id to clone (inclusive)
    #[schema(value_type = i64)]
    pub end_id: MessageId,
}

impl CloneRange {
    /// Create a bounded range
    pub fn new(start_id: MessageId, end_id: MessageId) -> Self {
        Self { start_id, end_id }
    }

    /// Range open towards the newest message, used when resuming
    pub fn starting_at(start_id: MessageId) -> Self {
        Self {
            start_id,
            end_id: MessageId::MAX,
        }
    }

    /// Whether `id` lies inside the range
    pub fn contains(&self, id: MessageId) -> bool {
        self.start_id <= id && id <= self.end_id
    }
}

impl std::fmt::Display for CloneRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.end_id == MessageId::MAX {
            write!(f, "{}..", self.start_id)
        } else {
            write!(f, "{}..={}", self.start_id, self.end_id)
        }
    }
}

/// Clone job state
///
/// `Idle → Collecting → Ready → Cloning → {Completed | StoppedEarly | Failed}`,
/// returning to `Idle` once the job is finalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// No job running; accepts a new clone request
    #[default]
    Idle,
    /// Walking the source channel history
    Collecting,
    /// History collected and filtered, about to replicate
    Ready,
    /// Replicating messages into the target channel
    Cloning,
    /// Every selected message was processed
    Completed,
    /// A stop request ended the job before the end of the selection
    StoppedEarly,
    /// Initialization or channel resolution failed
    Failed,
}

impl JobState {
    /// Terminal states end a job
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::StoppedEarly | JobState::Failed
        )
    }

    /// Non-terminal, non-idle states
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            JobState::Collecting | JobState::Ready | JobState::Cloning
        )
    }
}

/// Job advancement as `(done, total)`. `done` never exceeds `total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Progress {
    /// Items processed so far
    pub done: u64,
    /// Items selected for this job
    pub total: u64,
}

impl Progress {
    /// Fresh progress for `total` items
    pub fn new(total: u64) -> Self {
        Self { done: 0, total }
    }

    /// Record one more processed item, saturating at `total`
    pub fn advance(&mut self) {
        self.done = (self.done + 1).min(self.total);
    }

    /// Completion percentage (0.0 to 100.0)
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        (self.done as f32 / self.total as f32) * 100.0
    }

    /// `[done, total]` pair as persisted in status snapshots
    pub fn as_pair(&self) -> (u64, u64) {
        (self.done, self.total)
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.done, self.total)
    }
}

/// Status snapshot persisted to `status_<user>.json` on every update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusSnapshot {
    /// Last status text shown to the user
    pub message: String,
    /// Local wall-clock time of the update, `HH:MM:SS`
    pub timestamp: String,
    /// `[done, total]`
    #[schema(value_type = Vec<u64>)]
    pub progress: (u64, u64),
}

/// Live view of a user's job, served to status queries
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobInfo {
    /// Owner of the job
    pub user_id: UserId,
    /// Current state
    pub state: JobState,
    /// True while the job holds the user's slot
    pub is_running: bool,
    /// Processed / selected items
    pub progress: Progress,
    /// Last status text
    pub last_status: Option<String>,
    /// `HH:MM:SS` time of the last status update
    pub last_update: Option<String>,
    /// Selected range, if the clone is bounded
    pub range: Option<CloneRange>,
}

impl JobInfo {
    /// Info for a user with no active job
    pub fn idle(user_id: UserId) -> Self {
        Self {
            user_id,
            state: JobState::Idle,
            is_running: false,
            progress: Progress::default(),
            last_status: None,
            last_update: None,
            range: None,
        }
    }
}

/// Terminal result of a clone job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobOutcome {
    /// Owner of the job
    pub user_id: UserId,
    /// Terminal state (`Completed`, `StoppedEarly` or `Failed`)
    pub state: JobState,
    /// Final progress
    pub progress: Progress,
    /// Number of items whose transfer failed and were skipped
    pub failed_items: u64,
}

/// Event emitted during the clone job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A job was accepted and spawned
    JobStarted {
        /// Owner of the job
        user_id: UserId,
        /// Selected range, if bounded
        range: Option<CloneRange>,
    },

    /// The reporter published a new status line
    StatusChanged {
        /// Owner of the job
        user_id: UserId,
        /// State at the time of the update
        state: JobState,
        /// Status text
        message: String,
        /// Progress at the time of the update
        progress: Progress,
    },

    /// A history page was collected
    Collected {
        /// Owner of the job
        user_id: UserId,
        /// Messages collected so far
        count: u64,
    },

    /// Collection and filtering finished
    Ready {
        /// Owner of the job
        user_id: UserId,
        /// Messages selected for replication
        total: u64,
    },

    /// One more message was replicated
    Progress {
        /// Owner of the job
        user_id: UserId,
        /// Processed items
        done: u64,
        /// Selected items
        total: u64,
    },

    /// A message failed to transfer and was skipped
    ItemFailed {
        /// Owner of the job
        user_id: UserId,
        /// Source message id
        #[schema(value_type = i64)]
        message_id: MessageId,
        /// Error message
        error: String,
    },

    /// The job reached a terminal state
    JobFinished {
        /// Owner of the job
        user_id: UserId,
        /// Terminal state
        state: JobState,
        /// Final progress
        progress: Progress,
    },

    /// The cloner is shutting down
    Shutdown,
}
