//! Scoped temporary audio files.
//!
//! Every audio file a pipeline run touches is private to that run and
//! must disappear on every exit path, including early returns and
//! contained failures. The guard deletes its file on drop; a failed
//! deletion is logged and never escalated.

use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

/// RAII guard around one temporary audio file.
#[derive(Debug)]
pub struct TempAudio {
    path: PathBuf,
}

impl TempAudio {
    /// Reserve a uniquely named file under `dir` (created if missing).
    /// The file itself is only created by [`TempAudio::write`].
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub async fn create(dir: &Path, label: &str, extension: &str) -> io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{label}_{}.{extension}", Uuid::new_v4()));
        Ok(Self { path })
    }

    /// Write the audio bytes.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(&self.path, bytes).await
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudio {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "Failed to remove temp audio file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("coach_temp_{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_write_and_cleanup_on_drop() {
        let dir = scratch_dir();
        let path = {
            let audio = TempAudio::create(&dir, "voice", "ogg").await.unwrap();
            audio.write(b"fake ogg bytes").await.unwrap();
            assert!(audio.path().exists());
            audio.path().to_path_buf()
        };
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_drop_without_write_is_silent() {
        let dir = scratch_dir();
        {
            let audio = TempAudio::create(&dir, "voice", "ogg").await.unwrap();
            assert!(!audio.path().exists());
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_unique_names() {
        let dir = scratch_dir();
        let a = TempAudio::create(&dir, "voice", "ogg").await.unwrap();
        let b = TempAudio::create(&dir, "voice", "ogg").await.unwrap();
        assert_ne!(a.path(), b.path());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
