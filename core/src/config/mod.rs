pub mod expand;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Identity and credentials of one FTP server.
///
/// Immutable once a [`Connection`](crate::connection::Connection) is built
/// from it; temporary sibling connections clone it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Session idle timeout in seconds. A session quiet for longer is
    /// probed and flagged disconnected when the probe fails.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_ftp_port(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Return a copy with all `${env:...}` placeholders expanded.
    pub fn expand(mut self) -> Self {
        self.host = expand::expand_env_placeholders(&self.host);
        self.username = expand::expand_env_placeholders(&self.username);
        self.password = expand::expand_env_placeholders(&self.password);
        self
    }

    /// The idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether two configs address the same server account.
    pub fn same_server(&self, other: &ServerConfig) -> bool {
        self.host == other.host && self.port == other.port && self.username == other.username
    }
}

/// Externally injected runtime options for the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreConfig {
    /// Interval between idle-connection probes, in seconds.
    #[serde(default = "default_idle_check_interval_secs")]
    pub idle_check_interval_secs: u64,
    /// Directory for transient staging files (remote-to-remote transfers,
    /// remote-content editing). Entries are safe to delete after each use.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Polling interval of the upload dispatcher, in milliseconds.
    #[serde(default = "default_dispatch_interval_ms")]
    pub dispatch_interval_ms: u64,
    /// Maximum caller-driven re-submissions of a failed save. The core
    /// never retries on its own; this caps how often a caller may.
    #[serde(default = "default_max_upload_retries")]
    pub max_upload_retries: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            idle_check_interval_secs: default_idle_check_interval_secs(),
            staging_dir: default_staging_dir(),
            dispatch_interval_ms: default_dispatch_interval_ms(),
            max_upload_retries: default_max_upload_retries(),
        }
    }
}

impl CoreConfig {
    /// Return a copy with `~` expanded in the staging directory.
    pub fn expand(mut self) -> Self {
        if let Some(s) = self.staging_dir.to_str() {
            self.staging_dir = PathBuf::from(expand::expand_tilde(s));
        }
        self
    }

    /// The idle-probe interval as a [`Duration`].
    pub fn idle_check_interval(&self) -> Duration {
        Duration::from_secs(self.idle_check_interval_secs)
    }

    /// The dispatcher polling interval as a [`Duration`].
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }
}

// --- Default value functions ---

fn default_ftp_port() -> u16 {
    21
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_idle_check_interval_secs() -> u64 {
    30
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("ftpdeck")
}

fn default_dispatch_interval_ms() -> u64 {
    250
}

fn default_max_upload_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_default() {
        let cfg = ServerConfig::default();
        assert!(cfg.host.is_empty());
        assert_eq!(cfg.port, 21);
        assert!(cfg.username.is_empty());
        assert!(cfg.password.is_empty());
        assert_eq!(cfg.timeout_secs, 300);
    }

    #[test]
    fn core_config_default() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.idle_check_interval_secs, 30);
        assert_eq!(cfg.dispatch_interval_ms, 250);
        assert_eq!(cfg.max_upload_retries, 3);
        assert!(cfg.staging_dir.ends_with("ftpdeck"));
    }

    #[test]
    fn server_config_camel_case_fields() {
        let json = r#"{
            "host": "ftp.example.com",
            "port": 2121,
            "username": "deploy",
            "password": "secret",
            "timeoutSecs": 60
        }"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.host, "ftp.example.com");
        assert_eq!(cfg.port, 2121);
        assert_eq!(cfg.timeout_secs, 60);
    }

    #[test]
    fn server_config_missing_fields_use_defaults() {
        let json = r#"{"host": "h", "username": "u"}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.port, 21);
        assert!(cfg.password.is_empty());
        assert_eq!(cfg.timeout_secs, 300);
    }

    #[test]
    fn core_config_missing_fields_use_defaults() {
        let json = r#"{}"#;
        let cfg: CoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.idle_check_interval_secs, 30);
        assert_eq!(cfg.max_upload_retries, 3);
    }

    #[test]
    fn server_config_roundtrip() {
        let cfg = ServerConfig {
            host: "ftp.example.com".into(),
            port: 21,
            username: "anonymous".into(),
            password: "guest@".into(),
            timeout_secs: 120,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn server_config_expand_replaces_placeholders() {
        std::env::set_var("FTPDECK_TEST_HOST", "10.0.0.5");
        std::env::set_var("FTPDECK_TEST_USER", "deploy");
        let cfg = ServerConfig {
            host: "${env:FTPDECK_TEST_HOST}".into(),
            username: "${env:FTPDECK_TEST_USER}".into(),
            ..ServerConfig::default()
        };
        let expanded = cfg.expand();
        assert_eq!(expanded.host, "10.0.0.5");
        assert_eq!(expanded.username, "deploy");
        std::env::remove_var("FTPDECK_TEST_HOST");
        std::env::remove_var("FTPDECK_TEST_USER");
    }

    #[test]
    fn core_config_expand_tilde_in_staging_dir() {
        let cfg = CoreConfig {
            staging_dir: PathBuf::from("~/staging"),
            ..CoreConfig::default()
        };
        let expanded = cfg.expand();
        assert!(
            !expanded.staging_dir.starts_with("~"),
            "tilde should be expanded, got: {}",
            expanded.staging_dir.display()
        );
    }

    #[test]
    fn same_server_compares_identity_not_timeout() {
        let a = ServerConfig {
            host: "ftp.example.com".into(),
            username: "u".into(),
            timeout_secs: 60,
            ..ServerConfig::default()
        };
        let mut b = a.clone();
        b.timeout_secs = 600;
        assert!(a.same_server(&b));

        b.host = "other.example.com".into();
        assert!(!a.same_server(&b));
    }

    #[test]
    fn durations() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.idle_check_interval(), Duration::from_secs(30));
        assert_eq!(cfg.dispatch_interval(), Duration::from_millis(250));
        let server = ServerConfig::default();
        assert_eq!(server.idle_timeout(), Duration::from_secs(300));
    }
}
