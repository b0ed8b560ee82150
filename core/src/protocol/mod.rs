//! Transport seam in front of the wire-level FTP client.
//!
//! The core drives a ready-made protocol client ([`suppaftp`]) and treats
//! its replies opaquely apart from classifying failures into the crate's
//! own error kinds. [`FtpTransport`] is the seam: the production
//! implementation wraps [`suppaftp::FtpStream`], tests substitute an
//! in-memory fake.

pub mod listing;

use std::io::Cursor;

use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::debug;

use crate::errors::{ConnectionError, FsError};

/// Synchronous wire operations against one FTP server.
///
/// Methods mirror the protocol's verbs; callers are expected to hold the
/// owning [`Connection`](crate::connection::Connection) behind a mutex,
/// the handle itself is not safe for concurrent use.
pub trait FtpTransport: Send {
    /// Open the control channel.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ConnectionError>;

    /// Authenticate on an open control channel.
    fn login(&mut self, username: &str, password: &str) -> Result<(), ConnectionError>;

    /// Close the control channel, releasing the handle.
    fn quit(&mut self) -> Result<(), ConnectionError>;

    /// Liveness probe.
    fn noop(&mut self) -> Result<(), ConnectionError>;

    /// Raw LIST lines for a directory path.
    fn list(&mut self, path: &str) -> Result<Vec<String>, FsError>;

    /// Download a file's full contents.
    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Upload, creating or overwriting the remote file.
    fn store(&mut self, path: &str, data: &[u8]) -> Result<(), FsError>;

    fn delete_file(&mut self, path: &str) -> Result<(), FsError>;

    fn remove_dir(&mut self, path: &str) -> Result<(), FsError>;

    fn make_dir(&mut self, path: &str) -> Result<(), FsError>;

    fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError>;
}

/// Shared factory for transports, so temporary sibling connections can be
/// created from an existing one (and tests can hand out fakes).
pub type TransportFactory =
    std::sync::Arc<dyn Fn() -> Box<dyn FtpTransport> + Send + Sync>;

/// Factory producing [`SuppaftpTransport`] instances.
pub fn suppaftp_factory() -> TransportFactory {
    std::sync::Arc::new(|| Box::new(SuppaftpTransport::new()))
}

/// Production transport over [`suppaftp::FtpStream`].
pub struct SuppaftpTransport {
    stream: Option<FtpStream>,
}

impl SuppaftpTransport {
    pub fn new() -> Self {
        Self { stream: None }
    }

    fn stream(&mut self) -> Result<&mut FtpStream, FsError> {
        self.stream
            .as_mut()
            .ok_or_else(|| ConnectionError::Lost("control channel is closed".into()).into())
    }
}

impl Default for SuppaftpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a file-operation failure by its reply text.
///
/// The reply body is otherwise treated opaquely; only the broad category
/// matters to callers.
fn classify_fs_error(context: &str, err: &suppaftp::FtpError) -> FsError {
    let text = err.to_string();
    let lower = text.to_lowercase();
    if lower.contains("not found") || lower.contains("no such") {
        FsError::NotFound(format!("{context}: {text}"))
    } else if lower.contains("permission") || lower.contains("denied") {
        FsError::PermissionDenied(format!("{context}: {text}"))
    } else {
        FsError::OperationFailed(format!("{context}: {text}"))
    }
}

impl FtpTransport for SuppaftpTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ConnectionError> {
        let addr = format!("{host}:{port}");
        debug!(%addr, "opening FTP control channel");
        let stream = FtpStream::connect(&addr)
            .map_err(|e| ConnectionError::Transport(format!("{addr}: {e}")))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn login(&mut self, username: &str, password: &str) -> Result<(), ConnectionError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ConnectionError::State("login requires an open channel".into()))?;
        stream
            .login(username, password)
            .map_err(|e| ConnectionError::Auth(e.to_string()))?;
        // Binary mode for everything; text-mode translation corrupts
        // arbitrary payloads.
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        Ok(())
    }

    fn quit(&mut self) -> Result<(), ConnectionError> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .quit()
                .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    fn noop(&mut self) -> Result<(), ConnectionError> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ConnectionError::Lost("control channel is closed".into()))?;
        stream
            .noop()
            .map_err(|e| ConnectionError::Lost(e.to_string()))
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, FsError> {
        let path = path.to_string();
        self.stream()?
            .list(Some(&path))
            .map_err(|e| classify_fs_error(&format!("LIST {path}"), &e))
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FsError> {
        let path = path.to_string();
        let cursor = self
            .stream()?
            .retr_as_buffer(&path)
            .map_err(|e| classify_fs_error(&format!("RETR {path}"), &e))?;
        Ok(cursor.into_inner())
    }

    fn store(&mut self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let path = path.to_string();
        let mut reader = Cursor::new(data);
        self.stream()?
            .put_file(&path, &mut reader)
            .map_err(|e| classify_fs_error(&format!("STOR {path}"), &e))?;
        Ok(())
    }

    fn delete_file(&mut self, path: &str) -> Result<(), FsError> {
        let path = path.to_string();
        self.stream()?
            .rm(&path)
            .map_err(|e| classify_fs_error(&format!("DELE {path}"), &e))
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), FsError> {
        let path = path.to_string();
        self.stream()?
            .rmdir(&path)
            .map_err(|e| classify_fs_error(&format!("RMD {path}"), &e))
    }

    fn make_dir(&mut self, path: &str) -> Result<(), FsError> {
        let path = path.to_string();
        self.stream()?
            .mkdir(&path)
            .map_err(|e| classify_fs_error(&format!("MKD {path}"), &e))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        let from = from.to_string();
        let to = to.to_string();
        self.stream()?
            .rename(&from, &to)
            .map_err(|e| classify_fs_error(&format!("RNFR {from}"), &e))
    }
}
