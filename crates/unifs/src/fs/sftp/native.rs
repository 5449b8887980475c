//! [`SftpClient`] over `russh` and `russh-sftp`.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client;
use russh_keys::key::PublicKey;
use russh_sftp::client::SftpSession;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::protocol::FileAttributes;
use tokio::io::AsyncWriteExt;
use unifs_types::{FsError, FsResult};

use super::client::{SftpClient, SftpFault, SftpListing};
use crate::config::SftpConfig;
use crate::fs::traits::ByteReader;

/// SSH event handler.
///
/// Host keys are accepted without verification; there is no known-hosts
/// store to check them against.
// TODO: verify host keys against ~/.ssh/known_hosts via russh_keys::check_known_hosts.
struct SshHandler;

#[async_trait]
impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        tracing::debug!("accepting ssh host key {}", server_public_key.fingerprint());
        Ok(true)
    }
}

/// An SFTP subsystem on an authenticated SSH session.
pub struct RusshSftpClient {
    ssh: client::Handle<SshHandler>,
    sftp: SftpSession,
}

impl RusshSftpClient {
    /// Connect, authenticate and open the `sftp` subsystem.
    pub async fn connect(config: &SftpConfig) -> FsResult<Self> {
        let options = &config.connection_options;
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: options.inactivity_timeout(),
            keepalive_interval: options.keepalive_interval(),
            ..Default::default()
        });

        let mut ssh = client::connect(ssh_config, (config.host.as_str(), config.port), SshHandler)
            .await
            .map_err(|e| ssh_error(e, &config.host))?;

        let authenticated = match &config.password {
            Some(password) => ssh.authenticate_password(config.user.as_str(), password.as_str()).await,
            None => ssh.authenticate_none(config.user.as_str()).await,
        }
        .map_err(|e| ssh_error(e, &config.host))?;
        if !authenticated {
            return Err(FsError::AuthenticationFailure {
                host: config.host.clone(),
                user: config.user.clone(),
                reason: "server rejected credentials".to_string(),
            });
        }

        let channel = ssh
            .channel_open_session()
            .await
            .map_err(|e| ssh_error(e, &config.host))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| ssh_error(e, &config.host))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| FsError::Protocol {
                code: None,
                message: format!("sftp subsystem: {e}"),
            })?;

        tracing::info!("sftp session ready on {}:{}", config.host, config.port);
        Ok(Self { ssh, sftp })
    }
}

fn ssh_error(err: russh::Error, host: &str) -> FsError {
    match err {
        russh::Error::IO(e) => FsError::io(host, e),
        other => FsError::Protocol {
            code: None,
            message: other.to_string(),
        },
    }
}

impl From<SftpError> for SftpFault {
    fn from(err: SftpError) -> Self {
        match err {
            SftpError::Status(status) => {
                SftpFault::status(status.status_code as u32, status.error_message)
            }
            other => SftpFault::transport(other.to_string()),
        }
    }
}

/// `NO_SUCH_FILE` is absence; every other status is a real failure.
fn absent_if_missing<T>(result: Result<T, SftpFault>) -> Result<Option<T>, SftpFault> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(fault) if fault.is_no_such_file() => Ok(None),
        Err(fault) => Err(fault),
    }
}

fn discriminator(attrs: &FileAttributes) -> char {
    if attrs.is_dir() {
        'd'
    } else if attrs.is_symlink() {
        'l'
    } else {
        '-'
    }
}

#[async_trait]
impl SftpClient for RusshSftpClient {
    async fn list(&self, path: &str) -> Result<Vec<SftpListing>, SftpFault> {
        let entries = self.sftp.read_dir(path).await?;
        Ok(entries
            .map(|entry| {
                let attrs = entry.metadata();
                SftpListing {
                    name: entry.file_name(),
                    size: attrs.size.unwrap_or(0),
                    kind: discriminator(&attrs),
                }
            })
            .collect())
    }

    async fn exists(&self, path: &str) -> Result<Option<char>, SftpFault> {
        let attrs = self.sftp.symlink_metadata(path).await.map_err(SftpFault::from);
        Ok(absent_if_missing(attrs)?.map(|attrs| discriminator(&attrs)))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, SftpFault> {
        Ok(self.sftp.read(path).await?)
    }

    async fn open_read(&self, path: &str) -> Result<ByteReader, SftpFault> {
        let file = self.sftp.open(path).await?;
        Ok(Box::pin(file))
    }

    async fn put(&self, path: &str, mut source: ByteReader) -> Result<(), SftpFault> {
        let mut file = self.sftp.create(path).await?;
        tokio::io::copy(&mut source, &mut file)
            .await
            .map_err(|e: io::Error| SftpFault::transport(e.to_string()))?;
        file.shutdown()
            .await
            .map_err(|e| SftpFault::transport(e.to_string()))
    }

    async fn mkdir(&self, path: &str) -> Result<(), SftpFault> {
        Ok(self.sftp.create_dir(path).await?)
    }

    async fn rmdir(&self, path: &str) -> Result<(), SftpFault> {
        Ok(self.sftp.remove_dir(path).await?)
    }

    async fn delete(&self, path: &str) -> Result<(), SftpFault> {
        Ok(self.sftp.remove_file(path).await?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), SftpFault> {
        Ok(self.sftp.rename(from, to).await?)
    }

    async fn end(&self) -> Result<(), SftpFault> {
        let subsystem = self.sftp.close().await.map_err(SftpFault::from);
        self.ssh
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| SftpFault::transport(e.to_string()))?;
        subsystem
    }
}
