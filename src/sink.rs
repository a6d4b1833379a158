//! Persistence boundary for validated cameras.

use crate::{ScanError, ValidatedCamera};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Stores validated cameras. Duplicate saves of the same endpoint are allowed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save(&self, camera: &ValidatedCamera) -> Result<(), ScanError>;
}

/// Appends one JSON object per line to a file.
pub struct JsonLinesSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn save(&self, camera: &ValidatedCamera) -> Result<(), ScanError> {
        let mut line = serde_json::to_vec(camera)?;
        line.push(b'\n');

        // One writer at a time keeps lines from interleaving.
        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| ScanError::SinkError(format!("{}: {}", self.path.display(), e)))?;

        file.write_all(&line)
            .await
            .map_err(|e| ScanError::SinkError(format!("{}: {}", self.path.display(), e)))?;
        file.flush().await?;

        debug!("Saved {} to {}", camera.url, self.path.display());
        Ok(())
    }
}
