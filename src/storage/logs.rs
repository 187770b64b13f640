//! Append-only sent log and error log.

use crate::error::{Error, Result};
use crate::types::{MessageId, UserId};
use crate::utils::error_log_timestamp;
use tokio::io::AsyncWriteExt;

use super::{StoreFile, UserStore};

impl UserStore {
    /// Record a processed message id at the end of the sent log
    pub async fn append_sent(&self, user: UserId, id: MessageId) -> Result<()> {
        self.append_line(user, StoreFile::SentLog, &id.to_string())
            .await
    }

    /// All ids in the sent log, in processing order
    ///
    /// A missing log is empty. Blank lines are skipped; any other unparsable
    /// line is reported as a storage error.
    pub async fn sent_ids(&self, user: UserId) -> Result<Vec<MessageId>> {
        let Some(contents) = self.read_optional(user, StoreFile::SentLog).await? else {
            return Ok(Vec::new());
        };

        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.parse::<MessageId>().map_err(|e| {
                    Error::Storage(format!("invalid sent log entry '{line}': {e}"))
                })
            })
            .collect()
    }

    /// Id of the most recently processed message, if the log has any entry
    pub async fn last_sent_id(&self, user: UserId) -> Result<Option<MessageId>> {
        let Some(contents) = self.read_optional(user, StoreFile::SentLog).await? else {
            return Ok(None);
        };

        let Some(line) = contents.lines().map(str::trim).rfind(|l| !l.is_empty()) else {
            return Ok(None);
        };

        line.parse::<MessageId>()
            .map(Some)
            .map_err(|e| Error::Storage(format!("invalid sent log entry '{line}': {e}")))
    }

    /// Append `"<timestamp>: <message>"` to the user's error log
    pub async fn append_error(&self, user: UserId, message: &str) -> Result<()> {
        let entry = format!("{}: {}", error_log_timestamp(), message);
        self.append_line(user, StoreFile::ErrorLog, &entry).await
    }

    /// Raw error log lines, oldest first
    pub async fn error_entries(&self, user: UserId) -> Result<Vec<String>> {
        Ok(self
            .read_optional(user, StoreFile::ErrorLog)
            .await?
            .map(|contents| contents.lines().map(str::to_string).collect())
            .unwrap_or_default())
    }

    async fn append_line(&self, user: UserId, kind: StoreFile, line: &str) -> Result<()> {
        let path = self.path_for(user, kind);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_optional(&self, user: UserId, kind: StoreFile) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(user, kind)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
