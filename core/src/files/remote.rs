//! Metadata access for files on the connected FTP server.

use tokio::sync::Mutex;

use super::util::{is_remote_root, remote_join, remote_name, remote_parent};
use crate::connection::SharedConnection;
use crate::errors::FsError;
use crate::protocol::listing::RemoteEntry;

/// A path on the remote server with a cached stat result.
///
/// Remote metadata costs a directory listing per question, so the first
/// answer is cached, including the answer "the path does not exist".
/// [`refresh`](RemoteFile::refresh) drops the cache when staleness
/// matters more than round trips.
pub struct RemoteFile {
    path: String,
    conn: SharedConnection,
    // None = not fetched yet; Some(None) = known to be missing.
    cached: Mutex<Option<Option<RemoteEntry>>>,
}

impl std::fmt::Debug for RemoteFile {
    // The connection handle carries no useful debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFile")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RemoteFile {
    pub fn new(conn: SharedConnection, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            conn,
            cached: Mutex::new(None),
        }
    }

    /// Build with an already-known stat result, as when the file came
    /// out of a directory listing. Avoids re-listing the parent.
    pub fn with_stat(conn: SharedConnection, path: impl Into<String>, entry: RemoteEntry) -> Self {
        Self {
            path: path.into(),
            conn,
            cached: Mutex::new(Some(Some(entry))),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn connection(&self) -> &SharedConnection {
        &self.conn
    }

    pub fn name(&self) -> String {
        if is_remote_root(&self.path) {
            "/".to_string()
        } else {
            remote_name(&self.path)
        }
    }

    /// Drop the cached stat so the next question hits the server.
    pub async fn refresh(&self) {
        *self.cached.lock().await = None;
    }

    async fn stat(&self) -> Result<Option<RemoteEntry>, FsError> {
        let mut cache = self.cached.lock().await;
        if let Some(known) = cache.as_ref() {
            return Ok(known.clone());
        }
        let entry = {
            let mut conn = self.conn.lock().await;
            conn.stat(&self.path)?
        };
        *cache = Some(entry.clone());
        Ok(entry)
    }

    pub async fn exists(&self) -> Result<bool, FsError> {
        Ok(self.stat().await?.is_some())
    }

    pub async fn is_directory(&self) -> Result<bool, FsError> {
        Ok(self.stat().await?.map(|e| e.is_directory()).unwrap_or(false))
    }

    pub async fn is_normal_file(&self) -> Result<bool, FsError> {
        Ok(self
            .stat()
            .await?
            .map(|e| !e.is_directory() && !e.is_symlink())
            .unwrap_or(false))
    }

    /// Size in bytes, `-1` when unknown or missing.
    pub async fn size(&self) -> Result<i64, FsError> {
        Ok(self.stat().await?.map(|e| e.size).unwrap_or(-1))
    }

    pub async fn permissions(&self) -> Result<Option<String>, FsError> {
        Ok(self.stat().await?.and_then(|e| e.permissions))
    }

    /// Modification time as the server printed it; listings carry no
    /// reliable timezone, so the text is passed through untouched.
    pub async fn modified(&self) -> Result<Option<String>, FsError> {
        Ok(self.stat().await?.and_then(|e| e.modified))
    }

    pub async fn is_symlink(&self) -> Result<bool, FsError> {
        Ok(self.stat().await?.map(|e| e.is_symlink()).unwrap_or(false))
    }

    /// Symlink target, with relative targets resolved against the
    /// link's parent directory.
    pub async fn symlink_target(&self) -> Result<Option<String>, FsError> {
        let Some(target) = self.stat().await?.and_then(|e| e.link_target) else {
            return Ok(None);
        };
        if target.starts_with('/') {
            return Ok(Some(target));
        }
        let parent = remote_parent(&self.path).unwrap_or_else(|| "/".to_string());
        Ok(Some(remote_join(&parent, &target)))
    }

    /// Closest ancestor that exists. The walk starts at the parent and
    /// never examines the path itself; the first existing ancestor wins
    /// whatever its type. The root terminates the walk; it always
    /// exists.
    pub async fn existing_parent(&self) -> Result<String, FsError> {
        if is_remote_root(&self.path) {
            return Ok("/".to_string());
        }
        let mut candidate = remote_parent(&self.path)
            .ok_or_else(|| FsError::Argument(format!("bad remote path: {}", self.path)))?;
        loop {
            if is_remote_root(&candidate) {
                return Ok("/".to_string());
            }
            let entry = {
                let mut conn = self.conn.lock().await;
                conn.stat(&candidate)?
            };
            if entry.is_some() {
                return Ok(candidate);
            }
            candidate = remote_parent(&candidate)
                .ok_or_else(|| FsError::Argument(format!("bad remote path: {candidate}")))?;
        }
    }
}
