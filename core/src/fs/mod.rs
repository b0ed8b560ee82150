//! Filesystem operations over one side of the connection.
//!
//! A [`FileSystem`] binds the generic operations (list, create, remove)
//! to either the local disk or one remote session. Cross-side work lives
//! in [`transfer`].

pub mod transfer;

use std::path::{Path, PathBuf};

use crate::connection::SharedConnection;
use crate::errors::FsError;
use crate::files::{CommonFile, LocalFile, RemoteFile};
use crate::files::util::remote_join;

/// One side of the connection, viewed as a filesystem.
pub enum FileSystem {
    Local,
    Remote(SharedConnection),
}

impl FileSystem {
    /// Wrap a path into this filesystem's [`CommonFile`] variant.
    pub fn get_file(&self, path: &str) -> CommonFile {
        match self {
            FileSystem::Local => CommonFile::Local(LocalFile::new(path)),
            FileSystem::Remote(conn) => CommonFile::Remote(RemoteFile::new(conn.clone(), path)),
        }
    }

    pub async fn file_exists(&self, path: &str) -> Result<bool, FsError> {
        self.get_file(path).exists().await
    }

    fn require_own(&self, file: &CommonFile) -> Result<(), FsError> {
        let matches = match self {
            FileSystem::Local => file.is_local(),
            FileSystem::Remote(_) => !file.is_local(),
        };
        if matches {
            Ok(())
        } else {
            Err(FsError::Argument(format!(
                "{} does not belong to this filesystem",
                file.path()
            )))
        }
    }

    async fn require_directory(&self, path: &str) -> Result<(), FsError> {
        if self.get_file(path).is_directory().await? {
            Ok(())
        } else {
            Err(FsError::Argument(format!("not a directory: {path}")))
        }
    }

    /// List a directory, directories first, then case-insensitive by
    /// name. Remote entries come back with their stat already primed
    /// from the listing.
    pub async fn list_files(&self, dir_path: &str) -> Result<Vec<CommonFile>, FsError> {
        match self {
            FileSystem::Local => {
                let mut entries = Vec::new();
                let mut reader = tokio::fs::read_dir(dir_path).await?;
                while let Some(entry) = reader.next_entry().await? {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let is_dir = entry
                        .file_type()
                        .await
                        .map(|t| t.is_dir())
                        .unwrap_or(false);
                    entries.push((is_dir, name, entry.path()));
                }
                sort_listing(&mut entries);
                Ok(entries
                    .into_iter()
                    .map(|(_, _, path)| CommonFile::Local(LocalFile::new(path)))
                    .collect())
            }
            FileSystem::Remote(conn) => {
                let listed = {
                    let mut guard = conn.lock().await;
                    guard.list_dir(dir_path)?
                };
                let mut entries: Vec<_> = listed
                    .into_iter()
                    .map(|e| {
                        let full = remote_join(dir_path, &e.name);
                        (e.is_directory(), e.name.clone(), (full, e))
                    })
                    .collect();
                sort_listing(&mut entries);
                Ok(entries
                    .into_iter()
                    .map(|(_, _, (full, e))| {
                        CommonFile::Remote(RemoteFile::with_stat(conn.clone(), full, e))
                    })
                    .collect())
            }
        }
    }

    /// Create an empty file or directory named after `file` inside
    /// `dest_dir`, mirroring the source's kind.
    pub async fn add_file(&self, file: &CommonFile, dest_dir: &str) -> Result<CommonFile, FsError> {
        self.require_own(file)?;
        self.require_directory(dest_dir).await?;
        let make_dir = file.is_directory().await?;

        match self {
            FileSystem::Local => {
                let target = Path::new(dest_dir).join(file.name());
                if make_dir {
                    tokio::fs::create_dir(&target).await?;
                } else {
                    tokio::fs::File::create(&target).await?;
                }
                Ok(CommonFile::Local(LocalFile::new(target)))
            }
            FileSystem::Remote(conn) => {
                let target = remote_join(dest_dir, &file.name());
                {
                    let mut guard = conn.lock().await;
                    if make_dir {
                        guard.make_dir(&target)?;
                    } else {
                        guard.store(&target, &[])?;
                    }
                }
                Ok(CommonFile::Remote(RemoteFile::new(conn.clone(), target)))
            }
        }
    }

    /// Remove a file or an empty directory.
    pub async fn remove_file(&self, file: &CommonFile) -> Result<(), FsError> {
        self.require_own(file)?;
        let is_dir = file.is_directory().await?;
        match self {
            FileSystem::Local => {
                let path = PathBuf::from(file.path());
                if is_dir {
                    tokio::fs::remove_dir(&path).await?;
                } else {
                    tokio::fs::remove_file(&path).await?;
                }
            }
            FileSystem::Remote(conn) => {
                let mut guard = conn.lock().await;
                if is_dir {
                    guard.remove_dir(&file.path())?;
                } else {
                    guard.delete_file(&file.path())?;
                }
            }
        }
        file.refresh().await;
        Ok(())
    }
}

fn sort_listing<T>(entries: &mut [(bool, String, T)]) {
    entries.sort_by(|(a_dir, a_name, _), (b_dir, b_name, _)| {
        b_dir
            .cmp(a_dir)
            .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
    });
}
