//! Durable per-user storage
//!
//! Every piece of per-user state lives in one file under the data directory,
//! named `{prefix}{user_id}.json` so existing deployments keep working.
//!
//! ## Submodules
//!
//! Methods on [`UserStore`] are organized by concern:
//! - [`status`] - Status snapshot written on every reporter update
//! - [`logs`] - Append-only sent log and error log
//! - [`markers`] - Presence-only Stop/Start control markers

use crate::config::UserConfig;
use crate::error::{Error, Result};
use crate::types::UserId;
use std::path::{Path, PathBuf};

mod logs;
mod markers;
mod status;

pub use markers::Marker;

/// Kinds of per-user files kept by the store
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreFile {
    /// Front-end owned settings (read-only here)
    Config,
    /// Last status snapshot
    Status,
    /// Newline-delimited ids of processed messages
    SentLog,
    /// Newline-delimited `"<timestamp>: <message>"` entries
    ErrorLog,
    /// Stop marker
    Stop,
    /// Start marker
    Start,
    /// Messaging client session data
    Session,
}

impl StoreFile {
    /// File name prefix preceding the user id
    pub fn prefix(&self) -> &'static str {
        match self {
            StoreFile::Config => "config_",
            StoreFile::Status => "status_",
            StoreFile::SentLog => "sent_",
            StoreFile::ErrorLog => "error_",
            StoreFile::Stop => "stop_",
            StoreFile::Start => "start_",
            StoreFile::Session => "session_",
        }
    }
}

/// File-backed store addressed by user id + purpose
#[derive(Clone, Debug)]
pub struct UserStore {
    root: PathBuf,
}

impl UserStore {
    /// Open the store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    root.display(),
                    e
                ),
            ))
        })?;
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a user's file of the given kind
    pub fn path_for(&self, user: UserId, kind: StoreFile) -> PathBuf {
        self.root.join(format!("{}{}.json", kind.prefix(), user))
    }

    /// Session file handed to the messaging client
    pub fn session_path(&self, user: UserId) -> PathBuf {
        self.path_for(user, StoreFile::Session)
    }

    /// Load the user's settings; a missing file yields empty settings
    pub async fn load_user_config(&self, user: UserId) -> Result<UserConfig> {
        let path = self.path_for(user, StoreFile::Config);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::Storage(format!(
                    "invalid user config '{}': {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(UserConfig::default()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
