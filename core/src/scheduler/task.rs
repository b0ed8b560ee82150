//! One backup-then-replace save against a file store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::connection::SharedConnection;
use crate::errors::FsError;

/// Backup names probed beyond `name~` before giving up.
const BACKUP_PROBE_LIMIT: u32 = 1000;

/// Minimal store surface a save needs, on either side of the wire.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, FsError>;
    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError>;
    async fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError>;
    async fn remove(&self, path: &str) -> Result<(), FsError>;
}

/// Local-disk store.
pub struct LocalStore;

#[async_trait]
impl FileStore for LocalStore {
    async fn exists(&self, path: &str) -> Result<bool, FsError> {
        Ok(tokio::fs::symlink_metadata(path).await.is_ok())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        Ok(tokio::fs::rename(from, to).await?)
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        Ok(tokio::fs::write(path, data).await?)
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        Ok(tokio::fs::remove_file(path).await?)
    }
}

/// Store backed by a shared FTP session.
pub struct RemoteStore {
    conn: SharedConnection,
}

impl RemoteStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl FileStore for RemoteStore {
    async fn exists(&self, path: &str) -> Result<bool, FsError> {
        self.conn.lock().await.exists(path)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FsError> {
        self.conn.lock().await.rename(from, to)
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        self.conn.lock().await.store(path, data)
    }

    async fn remove(&self, path: &str) -> Result<(), FsError> {
        self.conn.lock().await.delete_file(path)
    }
}

/// Where a save currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Ready,
    BackingUp,
    Uploading,
    Succeeded,
    Failed,
}

/// One pending save of `content` to `target_path`.
pub struct UploadTask {
    target_path: String,
    content: Vec<u8>,
    store: Arc<dyn FileStore>,
    backup_path: Option<String>,
    retry_count: u32,
    state: UploadState,
}

impl UploadTask {
    pub fn new(target_path: impl Into<String>, content: Vec<u8>, store: Arc<dyn FileStore>) -> Self {
        Self {
            target_path: target_path.into(),
            content,
            store,
            backup_path: None,
            retry_count: 0,
            state: UploadState::Ready,
        }
    }

    /// How many earlier attempts this save already had, as counted by
    /// the caller. Used by the scheduler's admission check.
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Run to a terminal state. The target either carries the new
    /// content afterwards or keeps its pre-save content; it is never
    /// left partially written.
    pub async fn run(&mut self) -> UploadState {
        match self.execute().await {
            Ok(()) => self.state = UploadState::Succeeded,
            Err(e) => {
                warn!(target = %self.target_path, error = %e, "save failed");
                self.state = UploadState::Failed;
            }
        }
        self.state
    }

    async fn execute(&mut self) -> Result<(), FsError> {
        self.state = UploadState::BackingUp;
        let had_target = self
            .store
            .exists(&self.target_path)
            .await
            .map_err(|e| FsError::Backup(format!("cannot probe {}: {e}", self.target_path)))?;
        if had_target {
            let backup = self.free_backup_name().await?;
            self.store
                .rename(&self.target_path, &backup)
                .await
                .map_err(|e| FsError::Backup(format!("cannot move {} aside: {e}", self.target_path)))?;
            debug!(target = %self.target_path, backup = %backup, "backed up before save");
            self.backup_path = Some(backup);
        }

        self.state = UploadState::Uploading;
        if let Err(e) = self.store.write(&self.target_path, &self.content).await {
            self.restore_backup().await;
            return Err(e);
        }

        if let Some(backup) = self.backup_path.take() {
            if let Err(e) = self.store.remove(&backup).await {
                warn!(backup = %backup, error = %e, "backup left behind after save");
            }
        }
        Ok(())
    }

    /// First unused name in the order `name~`, `name~.1`, `name~.2`, …
    async fn free_backup_name(&self) -> Result<String, FsError> {
        let base = format!("{}~", self.target_path);
        let mut candidate = base.clone();
        let mut suffix = 0;
        loop {
            let taken = self
                .store
                .exists(&candidate)
                .await
                .map_err(|e| FsError::Backup(format!("cannot probe {candidate}: {e}")))?;
            if !taken {
                return Ok(candidate);
            }
            suffix += 1;
            if suffix > BACKUP_PROBE_LIMIT {
                return Err(FsError::Backup(format!(
                    "no free backup name near {base} after {BACKUP_PROBE_LIMIT} probes"
                )));
            }
            candidate = format!("{base}.{suffix}");
        }
    }

    /// Undo a failed write: drop whatever landed at the target and put
    /// the backup back so the pre-save content survives.
    async fn restore_backup(&mut self) {
        let _ = self.store.remove(&self.target_path).await;
        if let Some(backup) = self.backup_path.take() {
            if let Err(e) = self.store.rename(&backup, &self.target_path).await {
                warn!(
                    target = %self.target_path,
                    backup = %backup,
                    error = %e,
                    "could not restore backup after failed save"
                );
            }
        }
    }
}
