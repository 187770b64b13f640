//! Scratch files for media in transit.

use std::path::{Path, PathBuf};

/// A downloaded media file that must not outlive its transfer
///
/// [`ScratchFile::release`] deletes the file once the upload finished. If the
/// guard is dropped without being released (an early return or the task being
/// aborted mid-upload) the file is removed synchronously in `Drop`.
pub(crate) struct ScratchFile {
    path: Option<PathBuf>,
}

impl ScratchFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    pub(crate) fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    /// Delete the file, tolerating it being gone already
    pub(crate) async fn release(mut self) {
        if let Some(path) = self.path.take() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch file");
                }
            }
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
