//! Backend configuration.
//!
//! A [`BackendConfig`] is the only place a backend kind is chosen. It
//! deserializes from TOML:
//!
//! ```toml
//! backend = "ftp"
//! host = "ftp.example.com"
//! user = "anonymous"
//! password = ""
//!
//! [connection_options]
//! connect_timeout_secs = 10
//! passive = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which backend to connect to, with its construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendConfig {
    /// The local disk. Paths are confined under `root` when it is set.
    Local {
        #[serde(default)]
        root: Option<PathBuf>,
    },
    Ftp(FtpConfig),
    Sftp(SftpConfig),
}

impl BackendConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Short backend name for logs.
    pub fn backend_name(&self) -> &'static str {
        match self {
            BackendConfig::Local { .. } => "local",
            BackendConfig::Ftp(_) => "ftp",
            BackendConfig::Sftp(_) => "sftp",
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local { root: None }
    }
}

/// Default location of the config file (`$XDG_CONFIG_HOME/unifs/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("unifs").join("config.toml"))
}

/// FTP connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtpConfig {
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Passed through to the native client.
    #[serde(default)]
    pub connection_options: FtpConnectionOptions,
}

impl FtpConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_ftp_port(),
            user: user.into(),
            password: password.into(),
            connection_options: FtpConnectionOptions::default(),
        }
    }
}

/// Native FTP client tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FtpConnectionOptions {
    /// Bounds the TCP connect and the whole login handshake.
    pub connect_timeout_secs: Option<u64>,
    /// Socket read timeout once connected.
    pub read_timeout_secs: Option<u64>,
    /// Passive (`PASV`) rather than active data connections.
    pub passive: bool,
}

impl Default for FtpConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: None,
            read_timeout_secs: None,
            passive: true,
        }
    }
}

impl FtpConnectionOptions {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}

/// SFTP connection settings. `user` is the SSH username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SftpConfig {
    pub host: String,
    #[serde(default = "default_sftp_port")]
    pub port: u16,
    pub user: String,
    /// `None` attempts the SSH `none` method.
    #[serde(default)]
    pub password: Option<String>,
    /// Passed through to the native client.
    #[serde(default)]
    pub connection_options: SftpConnectionOptions,
}

impl SftpConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port: default_sftp_port(),
            user: user.into(),
            password,
            connection_options: SftpConnectionOptions::default(),
        }
    }
}

/// Native SSH client tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SftpConnectionOptions {
    pub inactivity_timeout_secs: Option<u64>,
    pub keepalive_interval_secs: Option<u64>,
}

impl SftpConnectionOptions {
    pub fn inactivity_timeout(&self) -> Option<Duration> {
        self.inactivity_timeout_secs.map(Duration::from_secs)
    }

    pub fn keepalive_interval(&self) -> Option<Duration> {
        self.keepalive_interval_secs.map(Duration::from_secs)
    }
}

fn default_ftp_port() -> u16 {
    21
}

fn default_sftp_port() -> u16 {
    22
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config() {
        let config = BackendConfig::from_toml_str(
            r#"
            backend = "local"
            root = "/srv/data"
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            BackendConfig::Local {
                root: Some(PathBuf::from("/srv/data"))
            }
        );
        assert_eq!(config.backend_name(), "local");
    }

    #[test]
    fn test_ftp_config_defaults() {
        let config = BackendConfig::from_toml_str(
            r#"
            backend = "ftp"
            host = "ftp.example.com"
            user = "anonymous"
            "#,
        )
        .unwrap();
        let BackendConfig::Ftp(ftp) = config else {
            panic!("expected ftp config");
        };
        assert_eq!(ftp.port, 21);
        assert_eq!(ftp.password, "");
        assert!(ftp.connection_options.passive);
        assert_eq!(ftp.connection_options.connect_timeout(), None);
    }

    #[test]
    fn test_sftp_config_with_options() {
        let config = BackendConfig::from_toml_str(
            r#"
            backend = "sftp"
            host = "files.example.com"
            port = 2222
            user = "deploy"
            password = "secret"

            [connection_options]
            inactivity_timeout_secs = 60
            keepalive_interval_secs = 15
            "#,
        )
        .unwrap();
        let BackendConfig::Sftp(sftp) = config else {
            panic!("expected sftp config");
        };
        assert_eq!(sftp.port, 2222);
        assert_eq!(sftp.password.as_deref(), Some("secret"));
        assert_eq!(
            sftp.connection_options.inactivity_timeout(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            sftp.connection_options.keepalive_interval(),
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = BackendConfig::from_toml_str(r#"backend = "smb""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = BackendConfig::load(Path::new("/nonexistent/unifs/config.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = \"local\"\n").unwrap();
        assert_eq!(BackendConfig::load(&path).unwrap(), BackendConfig::default());
    }
}
