//! Status snapshot persistence.

use crate::error::{Error, Result};
use crate::types::{StatusSnapshot, UserId};

use super::{StoreFile, UserStore};

impl UserStore {
    /// Replace the user's status snapshot
    ///
    /// Written to a sibling temp file and renamed into place so readers never
    /// observe a half-written snapshot.
    pub async fn write_status(&self, user: UserId, snapshot: &StatusSnapshot) -> Result<()> {
        let path = self.path_for(user, StoreFile::Status);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(snapshot)?;

        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Last persisted status snapshot, if any
    pub async fn read_status(&self, user: UserId) -> Result<Option<StatusSnapshot>> {
        let path = self.path_for(user, StoreFile::Status);
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                Error::Storage(format!(
                    "invalid status snapshot '{}': {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}
