//! Presence-only control markers.
//!
//! A marker carries no meaning in its content; only whether the file exists.
//! Creating and removing are whole-file operations, so concurrent writers can
//! never leave a marker half-set.

use crate::error::{Error, Result};
use crate::types::UserId;

use super::{StoreFile, UserStore};

/// Control signal kept as a durable marker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Ask the running job to stop at its next check point
    Stop,
    /// Advisory record that a job was triggered; never consumed
    Start,
}

impl Marker {
    fn file(&self) -> StoreFile {
        match self {
            Marker::Stop => StoreFile::Stop,
            Marker::Start => StoreFile::Start,
        }
    }
}

impl UserStore {
    /// Create (or keep) the marker
    pub async fn set_marker(&self, user: UserId, marker: Marker) -> Result<()> {
        let contents: &[u8] = match marker {
            Marker::Stop => b"stop",
            Marker::Start => b"",
        };
        tokio::fs::write(self.path_for(user, marker.file()), contents).await?;
        Ok(())
    }

    /// Whether the marker is currently present
    pub async fn has_marker(&self, user: UserId, marker: Marker) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(user, marker.file())).await?)
    }

    /// Remove the marker if present; returns whether it was there
    ///
    /// Removal is the consume operation: when several callers race, exactly
    /// one of them observes `true`.
    pub async fn take_marker(&self, user: UserId, marker: Marker) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(user, marker.file())).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
