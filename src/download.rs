use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Where a downloaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub filename: String,
    pub location: Option<PathBuf>,
    pub bytes_written: usize,
}

/// The host's "save file" capability.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<SavedArtifact>;
}

/// Saves artifacts into a directory, creating it on first use.
/// Existing files are never overwritten: a taken name gets a `-1`, `-2`, ...
/// suffix before the extension.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<SavedArtifact> {
        fs::create_dir_all(&self.dir).await?;

        let mut attempt = 0;
        let (name, path, mut file) = loop {
            let name = numbered_name(filename, attempt);
            let path = self.dir.join(&name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => break (name, path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path).await;
            log::error!("Failed to write {}: {}", path.display(), e);
            return Err(e.into());
        }

        log::info!("💾 Saved {} bytes to {}", bytes.len(), path.display());
        Ok(SavedArtifact {
            filename: name,
            location: Some(path),
            bytes_written: bytes.len(),
        })
    }
}

const MAX_NAME_ATTEMPTS: usize = 1000;

/// `image.png` -> `image-<n>.png`; attempt 0 keeps the name as is.
fn numbered_name(filename: &str, attempt: usize) -> String {
    if attempt == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, attempt, ext),
        _ => format!("{}-{}", filename, attempt),
    }
}

/// Produces `<prefix>-<unix-millis>.<ext>` names. The millisecond value is
/// strictly increasing per namer, so back-to-back calls never collide.
#[derive(Debug)]
pub struct TimestampNamer {
    prefix: String,
    last_millis: AtomicI64,
}

impl TimestampNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_millis: AtomicI64::new(0),
        }
    }

    pub fn next_name(&self, extension: &str) -> String {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let millis = now.max(previous + 1);
        format!("{}-{}.{}", self.prefix, millis, extension)
    }
}
