//! In-memory FTP server fake for tests.
//!
//! All transports minted by one [`MemoryServer`]'s factory share the same
//! node tree, so temporary sibling connections observe each other's
//! writes just like real sessions against one server. Listings are
//! rendered as unix `ls -l` lines so the production parser is exercised.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::config::ServerConfig;
use crate::errors::{ConnectionError, FsError};
use crate::files::util::remote_parent;
use crate::protocol::{FtpTransport, TransportFactory};

/// Which transport calls should fail. All off by default.
#[derive(Debug, Clone, Default)]
pub struct TransportFailures {
    pub connect: bool,
    pub login: bool,
    pub noop: bool,
    pub quit: bool,
    pub list: bool,
    pub retrieve: bool,
    pub store: bool,
    pub delete: bool,
    pub rename: bool,
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
    Symlink(String),
}

#[derive(Default)]
struct ServerState {
    // Normalized absolute path -> node. The root is implicit.
    nodes: BTreeMap<String, Node>,
    failures: TransportFailures,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

impl ServerState {
    fn is_dir(&self, path: &str) -> bool {
        path == "/" || matches!(self.nodes.get(path), Some(Node::Dir))
    }

    fn ensure_parents(&mut self, path: &str) {
        let mut cur = path.to_string();
        while let Some(parent) = remote_parent(&cur) {
            if parent == "/" {
                break;
            }
            self.nodes.entry(parent.clone()).or_insert(Node::Dir);
            cur = parent;
        }
    }
}

/// Shared fixture behind every transport the factory produces.
#[derive(Clone)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState::default())),
        }
    }

    /// A server descriptor pointing at this fixture.
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            host: "ftp.example.test".into(),
            port: 21,
            username: "tester".into(),
            password: "secret".into(),
            timeout_secs: 300,
        }
    }

    /// A factory whose transports all share this fixture's state.
    pub fn factory(&self) -> TransportFactory {
        let state = self.state.clone();
        Arc::new(move || {
            Box::new(MemoryTransport {
                state: state.clone(),
                connected: false,
                logged_in: false,
            })
        })
    }

    pub fn set_failures(&self, failures: TransportFailures) {
        self.state.lock().unwrap().failures = failures;
    }

    /// Seed a file, creating intermediate directories.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        state.ensure_parents(&path);
        state.nodes.insert(path, Node::File(data.to_vec()));
    }

    /// Seed a directory, creating intermediate directories.
    pub fn add_dir(&self, path: &str) {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        state.ensure_parents(&path);
        state.nodes.insert(path, Node::Dir);
    }

    /// Seed a symlink entry.
    pub fn add_symlink(&self, path: &str, target: &str) {
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        state.ensure_parents(&path);
        state.nodes.insert(path, Node::Symlink(target.to_string()));
    }

    /// Current content of a file, `None` when absent or not a file.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().unwrap().nodes.get(&normalize(path)) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        let path = normalize(path);
        path == "/" || self.state.lock().unwrap().nodes.contains_key(&path)
    }
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryTransport {
    state: Arc<Mutex<ServerState>>,
    connected: bool,
    logged_in: bool,
}

impl MemoryTransport {
    fn require_session(&self) -> Result<(), FsError> {
        if self.logged_in {
            Ok(())
        } else {
            Err(FsError::Connection(ConnectionError::Lost(
                "no session".into(),
            )))
        }
    }

    fn render_line(name: &str, node: &Node) -> String {
        match node {
            Node::Dir => format!("drwxr-xr-x    2 ftp      ftp          4096 Jan 01 12:00 {name}"),
            Node::File(data) => format!(
                "-rw-r--r--    1 ftp      ftp      {:8} Jan 01 12:00 {name}",
                data.len()
            ),
            Node::Symlink(target) => format!(
                "lrwxrwxrwx    1 ftp      ftp            {} Jan 01 12:00 {name} -> {target}",
                target.len()
            ),
        }
    }
}

impl FtpTransport for MemoryTransport {
    fn connect(&mut self, host: &str, _port: u16) -> Result<(), ConnectionError> {
        if self.state.lock().unwrap().failures.connect {
            return Err(ConnectionError::Transport(format!(
                "connection to {host} refused"
            )));
        }
        self.connected = true;
        Ok(())
    }

    fn login(&mut self, username: &str, _password: &str) -> Result<(), ConnectionError> {
        if !self.connected {
            return Err(ConnectionError::State("not connected".into()));
        }
        if self.state.lock().unwrap().failures.login {
            return Err(ConnectionError::Auth(format!(
                "530 login incorrect for {username}"
            )));
        }
        self.logged_in = true;
        Ok(())
    }

    fn quit(&mut self) -> Result<(), ConnectionError> {
        let failing = self.state.lock().unwrap().failures.quit;
        self.connected = false;
        self.logged_in = false;
        if failing {
            return Err(ConnectionError::Transport(
                "421 service not available".into(),
            ));
        }
        Ok(())
    }

    fn noop(&mut self) -> Result<(), ConnectionError> {
        if !self.connected {
            return Err(ConnectionError::Lost("no open channel".into()));
        }
        if self.state.lock().unwrap().failures.noop {
            return Err(ConnectionError::Lost("421 timeout".into()));
        }
        Ok(())
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, FsError> {
        self.require_session()?;
        let path = normalize(path);
        let state = self.state.lock().unwrap();
        if state.failures.list {
            return Err(FsError::OperationFailed(format!("450 LIST {path} failed")));
        }
        if !state.is_dir(&path) {
            return Err(FsError::NotFound(path));
        }
        let mut lines = Vec::new();
        for (node_path, node) in &state.nodes {
            if remote_parent(node_path).as_deref() == Some(path.as_str()) {
                let name = crate::files::util::remote_name(node_path);
                lines.push(Self::render_line(&name, node));
            }
        }
        Ok(lines)
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, FsError> {
        self.require_session()?;
        let path = normalize(path);
        let state = self.state.lock().unwrap();
        if state.failures.retrieve {
            return Err(FsError::OperationFailed(format!("451 RETR {path} aborted")));
        }
        match state.nodes.get(&path) {
            Some(Node::File(data)) => Ok(data.clone()),
            _ => Err(FsError::NotFound(path)),
        }
    }

    fn store(&mut self, path: &str, data: &[u8]) -> Result<(), FsError> {
        self.require_session()?;
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if state.failures.store {
            return Err(FsError::OperationFailed(format!("552 STOR {path} failed")));
        }
        let parent = remote_parent(&path)
            .ok_or_else(|| FsError::Argument(format!("bad path: {path}")))?;
        if !state.is_dir(&parent) {
            return Err(FsError::NotFound(parent));
        }
        state.nodes.insert(path, Node::File(data.to_vec()));
        Ok(())
    }

    fn delete_file(&mut self, path: &str) -> Result<(), FsError> {
        self.require_session()?;
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if state.failures.delete {
            return Err(FsError::OperationFailed(format!("550 DELE {path} denied")));
        }
        match state.nodes.get(&path) {
            Some(Node::File(_)) | Some(Node::Symlink(_)) => {
                state.nodes.remove(&path);
                Ok(())
            }
            _ => Err(FsError::NotFound(path)),
        }
    }

    fn remove_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.require_session()?;
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if !state.is_dir(&path) || path == "/" {
            return Err(FsError::NotFound(path));
        }
        let occupied = state
            .nodes
            .keys()
            .any(|p| remote_parent(p).as_deref() == Some(path.as_str()));
        if occupied {
            return Err(FsError::OperationFailed(format!(
                "550 {path} is not empty"
            )));
        }
        state.nodes.remove(&path);
        Ok(())
    }

    fn make_dir(&mut self, path: &str) -> Result<(), FsError> {
        self.require_session()?;
        let path = normalize(path);
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(&path) || path == "/" {
            return Err(FsError::OperationFailed(format!(
                "550 {path} already exists"
            )));
        }
        let parent = remote_parent(&path)
            .ok_or_else(|| FsError::Argument(format!("bad path: {path}")))?;
        if !state.is_dir(&parent) {
            return Err(FsError::NotFound(parent));
        }
        state.nodes.insert(path, Node::Dir);
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), FsError> {
        self.require_session()?;
        let from = normalize(from);
        let to = normalize(to);
        let mut state = self.state.lock().unwrap();
        if state.failures.rename {
            return Err(FsError::OperationFailed(format!(
                "550 RNTO {to} denied"
            )));
        }
        let node = state
            .nodes
            .remove(&from)
            .ok_or_else(|| FsError::NotFound(from.clone()))?;
        if matches!(node, Node::Dir) {
            // Carry the subtree along with the directory itself.
            let prefix = format!("{from}/");
            let moved: Vec<(String, Node)> = state
                .nodes
                .iter()
                .filter(|(p, _)| p.starts_with(&prefix))
                .map(|(p, n)| (format!("{to}/{}", &p[prefix.len()..]), n.clone()))
                .collect();
            state.nodes.retain(|p, _| !p.starts_with(&prefix));
            state.nodes.extend(moved);
        }
        state.nodes.insert(to, node);
        Ok(())
    }
}
