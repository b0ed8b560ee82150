//! File abstractions spanning the local disk and the remote server.
//!
//! [`CommonFile`] is the single currency the rest of the crate deals in:
//! transfer and listing code asks it questions without caring which side
//! of the wire the file lives on.

pub mod local;
pub mod remote;
pub mod util;

use std::path::PathBuf;

use crate::errors::FsError;

pub use local::LocalFile;
pub use remote::RemoteFile;

/// A file on either side of the connection.
#[derive(Debug)]
pub enum CommonFile {
    Local(LocalFile),
    Remote(RemoteFile),
}

impl CommonFile {
    pub fn is_local(&self) -> bool {
        matches!(self, CommonFile::Local(_))
    }

    pub fn name(&self) -> String {
        match self {
            CommonFile::Local(f) => f.name(),
            CommonFile::Remote(f) => f.name(),
        }
    }

    /// Full path as a string, in the syntax of the side it lives on.
    pub fn path(&self) -> String {
        match self {
            CommonFile::Local(f) => f.path().to_string_lossy().into_owned(),
            CommonFile::Remote(f) => f.path().to_string(),
        }
    }

    pub async fn exists(&self) -> Result<bool, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f.exists().await),
            CommonFile::Remote(f) => f.exists().await,
        }
    }

    pub async fn is_directory(&self) -> Result<bool, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f.is_directory().await),
            CommonFile::Remote(f) => f.is_directory().await,
        }
    }

    /// A regular file: not a directory, not a symlink.
    pub async fn is_normal_file(&self) -> Result<bool, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f.is_normal_file().await && !f.is_symlink().await),
            CommonFile::Remote(f) => f.is_normal_file().await,
        }
    }

    /// Size in bytes, `-1` when unknown.
    pub async fn size(&self) -> Result<i64, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f.size().await),
            CommonFile::Remote(f) => f.size().await,
        }
    }

    pub async fn permissions(&self) -> Result<Option<String>, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f.permissions().await),
            CommonFile::Remote(f) => f.permissions().await,
        }
    }

    pub async fn modified(&self) -> Result<Option<String>, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f.modified().await),
            CommonFile::Remote(f) => f.modified().await,
        }
    }

    pub async fn is_symlink(&self) -> Result<bool, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f.is_symlink().await),
            CommonFile::Remote(f) => f.is_symlink().await,
        }
    }

    pub async fn symlink_target(&self) -> Result<Option<String>, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f
                .symlink_target()
                .await
                .map(|p: PathBuf| p.to_string_lossy().into_owned())),
            CommonFile::Remote(f) => f.symlink_target().await,
        }
    }

    /// Closest existing ancestor, never the path itself. `None` when
    /// even the local filesystem root cannot be reached.
    pub async fn existing_parent(&self) -> Result<Option<String>, FsError> {
        match self {
            CommonFile::Local(f) => Ok(f
                .existing_parent()
                .await
                .map(|p| p.to_string_lossy().into_owned())),
            CommonFile::Remote(f) => f.existing_parent().await.map(Some),
        }
    }

    /// Invalidate any cached metadata.
    pub async fn refresh(&self) {
        if let CommonFile::Remote(f) = self {
            f.refresh().await;
        }
    }
}
