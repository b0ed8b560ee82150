//! Metadata access for files on the local disk.

use std::path::{Path, PathBuf};

use super::util::{format_permissions, iso_timestamp};

/// A path on the local filesystem, queried lazily.
///
/// Local metadata is cheap, so every question goes straight to the
/// filesystem and always reflects the current state.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, or the whole path when there is none.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::symlink_metadata(&self.path).await.is_ok()
    }

    /// True for directories, following symlinks.
    pub async fn is_directory(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => false,
        }
    }

    /// True for regular files, following symlinks.
    pub async fn is_normal_file(&self) -> bool {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        }
    }

    /// Size in bytes, `-1` when the file cannot be read.
    pub async fn size(&self) -> i64 {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len() as i64,
            Err(_) => -1,
        }
    }

    /// Permission string in `rwxr-xr-x` form. `None` off unix or when
    /// the file is unreadable.
    pub async fn permissions(&self) -> Option<String> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = tokio::fs::symlink_metadata(&self.path).await.ok()?;
            Some(format_permissions(meta.permissions().mode()))
        }
        #[cfg(not(unix))]
        {
            None
        }
    }

    /// Last modification time as an RFC 3339 timestamp.
    pub async fn modified(&self) -> Option<String> {
        let meta = tokio::fs::symlink_metadata(&self.path).await.ok()?;
        let time = meta.modified().ok()?;
        Some(iso_timestamp(time))
    }

    pub async fn is_symlink(&self) -> bool {
        match tokio::fs::symlink_metadata(&self.path).await {
            Ok(meta) => meta.file_type().is_symlink(),
            Err(_) => false,
        }
    }

    /// Symlink target, with relative targets resolved against the
    /// link's parent directory.
    pub async fn symlink_target(&self) -> Option<PathBuf> {
        let target = tokio::fs::read_link(&self.path).await.ok()?;
        if target.is_absolute() {
            Some(target)
        } else {
            match self.path.parent() {
                Some(parent) => Some(parent.join(target)),
                None => Some(target),
            }
        }
    }

    /// Closest ancestor that exists. The walk starts at the parent and
    /// never examines the path itself; the first existing ancestor wins
    /// whatever its type.
    pub async fn existing_parent(&self) -> Option<PathBuf> {
        let mut candidate: Option<&Path> = self.path.parent();
        while let Some(path) = candidate {
            if tokio::fs::symlink_metadata(path).await.is_ok() {
                return Some(path.to_path_buf());
            }
            candidate = path.parent();
        }
        None
    }
}
