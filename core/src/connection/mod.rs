//! Connection lifecycle for one FTP session.
//!
//! A [`Connection`] owns one protocol handle and moves through the states
//! Disconnected → Connected → LoggedIn. The handle is not safe for
//! concurrent use, so shared connections live behind a
//! [`tokio::sync::Mutex`] ([`SharedConnection`]); long transfers use a
//! [temporary sibling](Connection::temporary) instead of blocking the
//! browsing session.
//!
//! Staleness is detected out-of-band: [`spawn_idle_monitor`] probes quiet
//! sessions with NOOP and flags dead ones Disconnected, so the next
//! operation fails fast with [`ConnectionError::Lost`] instead of hanging.

pub mod manager;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::errors::{ConnectionError, FsError};
use crate::files::util::{is_remote_root, remote_name, remote_parent};
use crate::protocol::listing::{self, EntryKind, RemoteEntry};
use crate::protocol::{suppaftp_factory, FtpTransport, TransportFactory};

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    LoggedIn,
}

/// A connection shared across async tasks.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// One stateful FTP session.
pub struct Connection {
    config: ServerConfig,
    transport: Box<dyn FtpTransport>,
    factory: TransportFactory,
    state: ConnectionState,
    idle_timeout: Duration,
    last_activity: Instant,
}

impl Connection {
    /// Create a disconnected connection using the production transport.
    pub fn open(config: ServerConfig) -> Self {
        Self::with_factory(config, suppaftp_factory())
    }

    /// Create a disconnected connection with an injected transport factory.
    pub fn with_factory(config: ServerConfig, factory: TransportFactory) -> Self {
        let transport = factory();
        let idle_timeout = config.idle_timeout();
        Self {
            config,
            transport,
            factory,
            state: ConnectionState::Disconnected,
            idle_timeout,
            last_activity: Instant::now(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == ConnectionState::LoggedIn
    }

    /// Wrap into the shared handle used across tasks.
    pub fn into_shared(self) -> SharedConnection {
        Arc::new(Mutex::new(self))
    }

    /// A new sibling connection for side work: same server descriptor,
    /// fresh handle, independent state. Closing it never affects `self`.
    pub fn temporary(&self) -> Connection {
        Connection::with_factory(self.config.clone(), self.factory.clone())
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Open the transport. No-op when already connected.
    pub fn connect(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Disconnected {
            return Ok(());
        }
        self.transport.connect(&self.config.host, self.config.port)?;
        self.state = ConnectionState::Connected;
        self.touch();
        info!(host = %self.config.host, port = self.config.port, "connected");
        Ok(())
    }

    /// Authenticate. Requires a prior [`connect()`](Self::connect);
    /// no-op when already logged in.
    pub fn login(&mut self) -> Result<(), ConnectionError> {
        match self.state {
            ConnectionState::LoggedIn => return Ok(()),
            ConnectionState::Disconnected => {
                return Err(ConnectionError::State(
                    "login requires a connected session".into(),
                ))
            }
            ConnectionState::Connected => {}
        }
        self.transport
            .login(&self.config.username, &self.config.password)?;
        self.state = ConnectionState::LoggedIn;
        self.touch();
        info!(host = %self.config.host, user = %self.config.username, "logged in");
        Ok(())
    }

    /// Drop back to Connected. No-op unless logged in.
    pub fn logout(&mut self) {
        if self.state == ConnectionState::LoggedIn {
            self.state = ConnectionState::Connected;
            debug!(host = %self.config.host, "logged out");
        }
    }

    /// Tear down the session. The state always ends Disconnected and the
    /// handle is released even when the QUIT exchange fails; calling this
    /// on an already-disconnected instance succeeds.
    pub fn disconnect(&mut self) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }
        let result = self.transport.quit();
        self.state = ConnectionState::Disconnected;
        if let Err(ref e) = result {
            debug!(host = %self.config.host, error = %e, "QUIT failed during disconnect");
        } else {
            info!(host = %self.config.host, "disconnected");
        }
        result
    }

    /// Probe a quiet session. Returns `false` when the session turned out
    /// to be stale and was flagged Disconnected.
    pub fn check_idle(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        if self.last_activity.elapsed() < self.idle_timeout {
            return true;
        }
        match self.transport.noop() {
            Ok(()) => {
                self.touch();
                true
            }
            Err(e) => {
                warn!(host = %self.config.host, error = %e, "idle session went stale");
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    fn require_session(&self) -> Result<(), ConnectionError> {
        match self.state {
            ConnectionState::LoggedIn => Ok(()),
            ConnectionState::Connected => Err(ConnectionError::State(
                "operation requires a logged-in session".into(),
            )),
            ConnectionState::Disconnected => Err(ConnectionError::Lost(format!(
                "session to {} is disconnected",
                self.config.host
            ))),
        }
    }

    // --- Session operations used by the file layer ---

    /// Parsed listing of a remote directory.
    pub fn list_dir(&mut self, path: &str) -> Result<Vec<RemoteEntry>, FsError> {
        self.require_session()?;
        let lines = self.transport.list(path)?;
        self.touch();
        Ok(listing::parse_listing(&lines))
    }

    /// Metadata for a single remote path, `None` when it does not exist.
    ///
    /// FTP has no portable stat command; the parent directory is listed
    /// and searched by name. The root always exists.
    pub fn stat(&mut self, path: &str) -> Result<Option<RemoteEntry>, FsError> {
        if is_remote_root(path) {
            return Ok(Some(RemoteEntry {
                name: "/".into(),
                kind: EntryKind::Directory,
                size: -1,
                permissions: None,
                modified: None,
                link_target: None,
            }));
        }
        let parent = remote_parent(path)
            .ok_or_else(|| FsError::Argument(format!("not an absolute remote path: {path}")))?;
        let name = remote_name(path);
        // A missing parent means the path itself is missing, not a failure.
        let entries = match self.list_dir(&parent) {
            Ok(entries) => entries,
            Err(FsError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(entries.into_iter().find(|e| e.name == name))
    }

    /// Whether a remote path currently exists.
    pub fn exists(&mut self, path: &str) -> Result<bool, FsError> {
        Ok(self.stat(path)?.is_some())
    }

    pub fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FsError> {
        self.require_session()?;
        let data = self.transport.retrieve(path)?;
        self.touch();
        Ok(data)
    }

    pub fn store(&mut self, path: &str, data: &[u8]) -> Result<(), FsError> {
        self.require_session()?;
        self.transport.store(path, data)?;
        self.touch();
        Ok(())
    }

    pub fn delete_file(&mut self, path: &str) -> Result<(), FsError> {
        self.require_session()?;
        self.transport.delete_file(path)?;
        self.touch();
        Ok(())
    }

    pub fn remove_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.require_session()?;
        self.transport.remove_dir(path)?;
        self.touch();
        Ok(())
    }

    pub fn make_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.require_session()?;
        self.transport.make_dir(path)?;
        self.touch();
        Ok(())
    }

    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        self.require_session()?;
        self.transport.rename(from, to)?;
        self.touch();
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.state != ConnectionState::Disconnected {
            let _ = self.transport.quit();
        }
    }
}

/// Periodically probe a shared connection for staleness.
///
/// The returned handle can be aborted at shutdown; a stale session is
/// flagged Disconnected so the next caller fails fast.
pub fn spawn_idle_monitor(
    conn: SharedConnection,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh connection
        // is not probed before it has done anything.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut guard = conn.lock().await;
            guard.check_idle();
        }
    })
}
