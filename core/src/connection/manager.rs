//! Process-wide registry of the single primary connection.
//!
//! Only one shared connection is registered at a time; it is the session
//! the interactive surface browses with. Temporary connections created
//! for background transfers are out-of-band and untracked.

use tokio::sync::Mutex;
use tracing::warn;

use super::SharedConnection;

/// Holds the primary [`SharedConnection`] slot.
pub struct ConnectionManager {
    shared: Mutex<Option<SharedConnection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(None),
        }
    }

    /// Install a new primary connection. Any previous one is
    /// disconnected first; a disconnect failure is logged and never
    /// blocks the swap.
    pub async fn set_shared(&self, conn: SharedConnection) {
        let mut slot = self.shared.lock().await;
        if let Some(old) = slot.take() {
            let mut old = old.lock().await;
            if let Err(e) = old.disconnect() {
                warn!(error = %e, "failed to disconnect replaced primary connection");
            }
        }
        *slot = Some(conn);
    }

    /// The current primary connection, if one is registered.
    pub async fn shared(&self) -> Option<SharedConnection> {
        self.shared.lock().await.clone()
    }

    /// Remove and disconnect the primary connection.
    pub async fn clear(&self) {
        let removed = {
            let mut slot = self.shared.lock().await;
            slot.take()
        };
        if let Some(conn) = removed {
            let mut conn = conn.lock().await;
            if let Err(e) = conn.disconnect() {
                warn!(error = %e, "failed to disconnect primary connection on clear");
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, ConnectionState};
    use crate::testutil::{MemoryServer, TransportFailures};

    fn shared_logged_in(server: &MemoryServer) -> SharedConnection {
        let mut conn = Connection::with_factory(server.config(), server.factory());
        conn.connect().unwrap();
        conn.login().unwrap();
        conn.into_shared()
    }

    #[tokio::test]
    async fn starts_empty() {
        let mgr = ConnectionManager::new();
        assert!(mgr.shared().await.is_none());
    }

    #[tokio::test]
    async fn set_and_get() {
        let server = MemoryServer::new();
        let mgr = ConnectionManager::new();
        let conn = shared_logged_in(&server);
        mgr.set_shared(conn.clone()).await;

        let got = mgr.shared().await.unwrap();
        assert!(std::sync::Arc::ptr_eq(&got, &conn));
    }

    #[tokio::test]
    async fn replacing_disconnects_the_old_primary() {
        let server = MemoryServer::new();
        let mgr = ConnectionManager::new();
        let first = shared_logged_in(&server);
        let second = shared_logged_in(&server);

        mgr.set_shared(first.clone()).await;
        mgr.set_shared(second.clone()).await;

        assert_eq!(
            first.lock().await.state(),
            ConnectionState::Disconnected
        );
        assert_eq!(second.lock().await.state(), ConnectionState::LoggedIn);
    }

    #[tokio::test]
    async fn swap_proceeds_when_old_disconnect_fails() {
        let server = MemoryServer::new();
        let mgr = ConnectionManager::new();
        let first = shared_logged_in(&server);
        mgr.set_shared(first.clone()).await;

        server.set_failures(TransportFailures {
            quit: true,
            ..Default::default()
        });
        let second = shared_logged_in(&server);
        mgr.set_shared(second.clone()).await;

        // The old primary was torn down even though QUIT failed, and
        // the replacement still took the slot.
        assert_eq!(first.lock().await.state(), ConnectionState::Disconnected);
        let got = mgr.shared().await.unwrap();
        assert!(std::sync::Arc::ptr_eq(&got, &second));
    }

    #[tokio::test]
    async fn clear_removes_and_disconnects() {
        let server = MemoryServer::new();
        let mgr = ConnectionManager::new();
        let conn = shared_logged_in(&server);
        mgr.set_shared(conn.clone()).await;

        mgr.clear().await;
        assert!(mgr.shared().await.is_none());
        assert_eq!(conn.lock().await.state(), ConnectionState::Disconnected);
    }
}
