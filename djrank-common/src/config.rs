//! Configuration loading
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (clap also folds in its `env` fallback)
//! 2. TOML config file
//! 3. Built-in default
//!
//! The config file itself is found via `--config`, then `DJRANK_CONFIG`,
//! then `<user config dir>/djrank/config.toml`. A missing default file is
//! not an error; a missing explicit file is.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::auth::{DEFAULT_LOCKOUT_WINDOW, DEFAULT_MAX_FAILED_ATTEMPTS};
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "DJRANK_CONFIG";

/// Environment variable holding the admin secret
pub const ADMIN_SECRET_ENV: &str = "DJRANK_ADMIN_SECRET";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5800;
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5800";

/// Storage backend served by djrank-server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Sqlite => f.write_str("sqlite"),
            Backend::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "memory" => Ok(Backend::Memory),
            other => Err(Error::Config(format!(
                "Unknown backend '{}' (expected sqlite or memory)",
                other
            ))),
        }
    }
}

// ========================================
// Config file
// ========================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub client: ClientSection,
}

/// `[server]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub backend: Option<Backend>,
    pub database_path: Option<PathBuf>,
    pub admin_secret: Option<String>,
    pub max_failed_attempts: Option<u32>,
    pub lockout_window_secs: Option<u64>,
    pub event_capacity: Option<usize>,
}

/// `[client]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    pub server_url: Option<String>,
    pub admin_token: Option<String>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load the config file named by `explicit`, `DJRANK_CONFIG` or the
    /// platform default
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit.map(Path::to_path_buf).or(env_path), default_config_path())
    }

    fn load_from(explicit: Option<PathBuf>, default: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
            })?;
            info!("Loaded config file: {}", path.display());
            return Self::parse(&text);
        }

        match default {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(&path)?;
                info!("Loaded config file: {}", path.display());
                Self::parse(&text)
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// `<user config dir>/djrank/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("djrank").join("config.toml"))
}

/// `<local data dir>/djrank/djrank.db`, or `./djrank.db` when the platform
/// has no data dir
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("djrank"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("djrank.db")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ========================================
// Resolved settings
// ========================================

/// Server settings supplied on the command line (or their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub backend: Option<Backend>,
    pub database_path: Option<PathBuf>,
    pub admin_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub backend: Backend,
    pub database_path: PathBuf,
    /// `None` disables every mutating endpoint
    pub admin_secret: Option<String>,
    pub max_failed_attempts: u32,
    pub lockout_window: Duration,
    pub event_capacity: usize,
}

impl ServerConfig {
    pub fn resolve(overrides: ServerOverrides, file: &ConfigFile) -> Self {
        let section = &file.server;
        Self {
            bind: overrides
                .bind
                .or_else(|| section.bind.clone())
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: overrides.port.or(section.port).unwrap_or(DEFAULT_PORT),
            backend: overrides.backend.or(section.backend).unwrap_or_default(),
            database_path: overrides
                .database_path
                .or_else(|| section.database_path.clone())
                .unwrap_or_else(default_database_path),
            admin_secret: non_blank(overrides.admin_secret)
                .or_else(|| non_blank(section.admin_secret.clone())),
            max_failed_attempts: section
                .max_failed_attempts
                .unwrap_or(DEFAULT_MAX_FAILED_ATTEMPTS),
            lockout_window: section
                .lockout_window_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LOCKOUT_WINDOW),
            event_capacity: section.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY).max(1),
        }
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Client settings supplied on the command line (or their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ClientOverrides {
    pub server_url: Option<String>,
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    /// Present = admin session
    pub admin_token: Option<String>,
}

impl ClientConfig {
    pub fn resolve(overrides: ClientOverrides, file: &ConfigFile) -> Self {
        let section = &file.client;
        Self {
            server_url: non_blank(overrides.server_url)
                .or_else(|| non_blank(section.server_url.clone()))
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            admin_token: non_blank(overrides.admin_token)
                .or_else(|| non_blank(section.admin_token.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        port = 6000
        backend = "memory"
        admin_secret = "from-file"
        max_failed_attempts = 3
        lockout_window_secs = 600

        [client]
        server_url = "http://rank.local:6000"
    "#;

    #[test]
    fn test_parse_config_file() {
        let file = ConfigFile::parse(SAMPLE).unwrap();
        assert_eq!(file.server.port, Some(6000));
        assert_eq!(file.server.backend, Some(Backend::Memory));
        assert_eq!(file.client.server_url.as_deref(), Some("http://rank.local:6000"));
        assert_eq!(file.client.admin_token, None);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = ConfigFile::parse("[server]\nport = \"high\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_cli_overrides_file_overrides_default() {
        let file = ConfigFile::parse(SAMPLE).unwrap();

        let config = ServerConfig::resolve(
            ServerOverrides {
                port: Some(7000),
                ..ServerOverrides::default()
            },
            &file,
        );
        assert_eq!(config.port, 7000);
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.admin_secret.as_deref(), Some("from-file"));
        assert_eq!(config.max_failed_attempts, 3);
        assert_eq!(config.lockout_window, Duration::from_secs(600));
        assert_eq!(config.listen_address(), "127.0.0.1:7000");
    }

    #[test]
    fn test_blank_secret_means_unset() {
        let config = ServerConfig::resolve(
            ServerOverrides {
                admin_secret: Some("  ".to_string()),
                ..ServerOverrides::default()
            },
            &ConfigFile::default(),
        );
        assert_eq!(config.admin_secret, None);
        assert_eq!(config.max_failed_attempts, DEFAULT_MAX_FAILED_ATTEMPTS);
    }

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::resolve(ClientOverrides::default(), &ConfigFile::default());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("SQLite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert_eq!("memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert!("postgres".parse::<Backend>().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(ConfigFile::load_from(Some(missing), None).is_err());
    }

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load_from(None, Some(dir.path().join("config.toml"))).unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let file = ConfigFile::load_from(Some(path), None).unwrap();
        assert_eq!(file.server.port, Some(6000));
    }
}
