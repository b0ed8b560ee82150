//! Copy and move across the local/remote boundary.
//!
//! Long transfers never run on the browsing session: every remote end is
//! served by a temporary sibling connection that is opened for the
//! operation and closed afterwards. Remote-to-remote transfers stage
//! through a local spool file because FTP has no server-side copy, even
//! when both ends point at the same server.

use std::path::PathBuf;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::connection::{Connection, SharedConnection};
use crate::errors::FsError;
use crate::files::util::remote_join;
use crate::files::{CommonFile, LocalFile, RemoteFile};

/// Cross-filesystem copy/move dispatcher.
pub struct Transfer {
    staging_dir: PathBuf,
}

impl Transfer {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    /// Copy a regular file into a destination directory. Returns the
    /// created destination file.
    pub async fn copy_files(
        &self,
        source: &CommonFile,
        dest_dir: &CommonFile,
    ) -> Result<CommonFile, FsError> {
        self.check_arguments(source, dest_dir).await?;
        self.copy_unchecked(source, dest_dir).await
    }

    /// Copy, then delete the source. A delete failure after a successful
    /// copy reports [`FsError::PartialFailure`]; the destination copy is
    /// kept.
    pub async fn move_files(
        &self,
        source: &CommonFile,
        dest_dir: &CommonFile,
    ) -> Result<CommonFile, FsError> {
        self.check_arguments(source, dest_dir).await?;

        // Local-to-local moves are a rename when that is all it takes.
        if let (CommonFile::Local(src), CommonFile::Local(dir)) = (source, dest_dir) {
            let target = dir.path().join(src.name());
            if tokio::fs::rename(src.path(), &target).await.is_ok() {
                return Ok(CommonFile::Local(LocalFile::new(target)));
            }
        }

        let copied = self.copy_unchecked(source, dest_dir).await?;
        if let Err(e) = self.delete_source(source).await {
            return Err(FsError::PartialFailure(format!(
                "copied {} to {} but could not remove the source: {e}",
                source.path(),
                copied.path()
            )));
        }
        source.refresh().await;
        Ok(copied)
    }

    async fn check_arguments(
        &self,
        source: &CommonFile,
        dest_dir: &CommonFile,
    ) -> Result<(), FsError> {
        if !dest_dir.is_directory().await? {
            return Err(FsError::Argument(format!(
                "destination is not a directory: {}",
                dest_dir.path()
            )));
        }
        if !source.exists().await? {
            return Err(FsError::NotFound(source.path()));
        }
        if source.is_directory().await? {
            return Err(FsError::Argument(format!(
                "directory sources are not transferable: {}",
                source.path()
            )));
        }
        Ok(())
    }

    async fn copy_unchecked(
        &self,
        source: &CommonFile,
        dest_dir: &CommonFile,
    ) -> Result<CommonFile, FsError> {
        let name = source.name();
        match (source, dest_dir) {
            (CommonFile::Local(src), CommonFile::Local(dir)) => {
                let target = dir.path().join(&name);
                tokio::fs::copy(src.path(), &target).await?;
                Ok(CommonFile::Local(LocalFile::new(target)))
            }
            (CommonFile::Local(src), CommonFile::Remote(dir)) => {
                let data = tokio::fs::read(src.path()).await?;
                let target = remote_join(dir.path(), &name);
                let mut temp = open_temporary(dir.connection()).await?;
                let result = temp.store(&target, &data);
                let _ = temp.disconnect();
                result?;
                Ok(CommonFile::Remote(RemoteFile::new(
                    dir.connection().clone(),
                    target,
                )))
            }
            (CommonFile::Remote(src), CommonFile::Local(dir)) => {
                let mut temp = open_temporary(src.connection()).await?;
                let result = temp.retrieve(src.path());
                let _ = temp.disconnect();
                let data = result?;
                let target = dir.path().join(&name);
                tokio::fs::write(&target, &data).await?;
                Ok(CommonFile::Local(LocalFile::new(target)))
            }
            (CommonFile::Remote(src), CommonFile::Remote(dir)) => {
                self.copy_remote_to_remote(src, dir, &name).await
            }
        }
    }

    /// Download to a staging file, upload from it, then drop it. The
    /// staging entry is transient; a leftover only costs disk space.
    async fn copy_remote_to_remote(
        &self,
        src: &RemoteFile,
        dir: &RemoteFile,
        name: &str,
    ) -> Result<CommonFile, FsError> {
        tokio::fs::create_dir_all(&self.staging_dir).await?;
        let staging = self.staging_dir.join(Uuid::new_v4().to_string());
        debug!(staging = %staging.display(), source = %src.path(), "staging remote transfer");

        let mut temp = open_temporary(src.connection()).await?;
        let result = temp.retrieve(src.path());
        let _ = temp.disconnect();
        tokio::fs::write(&staging, &result?).await?;

        let target = remote_join(dir.path(), name);
        let upload = async {
            let data = tokio::fs::read(&staging).await?;
            let mut temp = open_temporary(dir.connection()).await?;
            let result = temp.store(&target, &data);
            let _ = temp.disconnect();
            result
        }
        .await;

        if let Err(e) = tokio::fs::remove_file(&staging).await {
            warn!(staging = %staging.display(), error = %e, "could not remove staging file");
        }
        upload?;
        Ok(CommonFile::Remote(RemoteFile::new(
            dir.connection().clone(),
            target,
        )))
    }

    async fn delete_source(&self, source: &CommonFile) -> Result<(), FsError> {
        match source {
            CommonFile::Local(f) => Ok(tokio::fs::remove_file(f.path()).await?),
            CommonFile::Remote(f) => {
                let mut temp = open_temporary(f.connection()).await?;
                let result = temp.delete_file(f.path());
                let _ = temp.disconnect();
                result
            }
        }
    }
}

/// Open a logged-in sibling of a shared connection. The shared session
/// is only locked long enough to clone its descriptor.
async fn open_temporary(conn: &SharedConnection) -> Result<Connection, FsError> {
    let mut temp = {
        let guard = conn.lock().await;
        guard.temporary()
    };
    temp.connect()?;
    temp.login()?;
    Ok(temp)
}
