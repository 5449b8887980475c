//! FTP backend.
//!
//! FTP has no existence primitive and answers most failures with the same
//! `550` reply, so this adapter does the most normalization work:
//!
//! - `exists` lists the parent and looks for the entry by name; a `550` on
//!   the parent means absent
//! - conditions the server cannot express (`AlreadyExists`, `NotEmpty`,
//!   `IsADirectory`, `NotADirectory`) are probed before the native command
//! - recursive `mkdir`/`rmdir` are composed from single-directory commands

mod client;
mod handshake;
mod native;

pub use client::{FILE_UNAVAILABLE, FtpClient, FtpFault, FtpListing, NOT_LOGGED_IN};
pub use native::SuppaFtpClient;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use unifs_types::{ConnectionState, FileInfo, FileType, FsError, FsResult};

use self::handshake::Handshake;
use super::traits::{ByteReader, FileSystem};
use super::tree::{self, RemoteTree};
use crate::config::FtpConfig;
use crate::path;
use crate::session::SessionState;

/// Entry produced by [`FtpFileSystem::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpFileInfo {
    original: FtpListing,
}

impl FtpFileInfo {
    pub fn new(original: FtpListing) -> Self {
        Self { original }
    }

    /// The listing element as the server reported it.
    pub fn original(&self) -> &FtpListing {
        &self.original
    }
}

impl FileInfo for FtpFileInfo {
    fn name(&self) -> &str {
        &self.original.name
    }

    fn size(&self) -> u64 {
        self.original.size
    }

    fn file_type(&self) -> FileType {
        FileType::from_discriminator(self.original.kind)
    }

    fn is_directory(&self) -> bool {
        self.original.kind == 'd'
    }
}

/// How [`FtpFileSystem::close_with`] ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseMode {
    /// Let queued commands finish, log out, disconnect.
    #[default]
    Graceful,
    /// Drop the connection immediately; in-flight commands fail.
    Force,
}

/// FTP backend over one control connection.
pub struct FtpFileSystem {
    client: Box<dyn FtpClient>,
    state: SessionState,
}

impl FtpFileSystem {
    /// Connect and log in.
    ///
    /// Resolves exactly once: with the session when login completes, or with
    /// the first error (connect, login, or the handshake timer from
    /// `connect_timeout_secs`), whichever is reported first.
    pub async fn create(config: FtpConfig) -> FsResult<Self> {
        let state = SessionState::new(ConnectionState::Connecting);
        tracing::info!("connecting to ftp://{}@{}:{}", config.user, config.host, config.port);

        let (handshake, outcome) = Handshake::<SuppaFtpClient>::new();

        let signal = Arc::clone(&handshake);
        let connect_config = config.clone();
        tokio::task::spawn_blocking(move || {
            let result = SuppaFtpClient::connect_blocking(&connect_config)
                .map_err(|fault| handshake_error(fault, &connect_config));
            if !signal.settle(result) {
                tracing::debug!("ftp handshake finished after it was already settled");
            }
        });

        if let Some(limit) = config.connection_options.connect_timeout() {
            let signal = Arc::clone(&handshake);
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                if !signal.is_settled() {
                    signal.settle(Err(FsError::Protocol {
                        code: None,
                        message: format!("handshake timed out after {limit:?}"),
                    }));
                }
            });
        }
        // a panicking connect task must drop the last sender
        drop(handshake);

        let settled = outcome.await.unwrap_or_else(|_| {
            Err(FsError::Protocol {
                code: None,
                message: "ftp handshake abandoned".to_string(),
            })
        });
        match settled {
            Ok(client) => {
                state.set(ConnectionState::Ready);
                Ok(Self {
                    client: Box::new(client),
                    state,
                })
            }
            Err(e) => {
                state.set(ConnectionState::Failed);
                tracing::warn!("ftp connect to {} failed: {}", config.host, e);
                Err(e)
            }
        }
    }

    /// Wrap a collaborator whose session is already connected.
    pub fn from_client(client: impl FtpClient + 'static) -> Self {
        Self {
            client: Box::new(client),
            state: SessionState::new(ConnectionState::Ready),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Close the session gracefully or immediately.
    ///
    /// Closing an already closed session is a no-op. A failing `QUIT` is
    /// logged and not reported: the connection is released either way.
    pub async fn close_with(&self, mode: CloseMode) -> FsResult<()> {
        if !self.state.begin_close() {
            return Ok(());
        }
        match mode {
            CloseMode::Graceful => {
                if let Err(fault) = self.client.end().await {
                    tracing::warn!("ftp QUIT failed, dropping connection: {}", fault);
                    self.client.destroy().await;
                }
            }
            CloseMode::Force => self.client.destroy().await,
        }
        tracing::info!("ftp session closed ({:?})", mode);
        Ok(())
    }

    async fn listing(&self, path: &str) -> FsResult<Vec<FtpListing>> {
        let mut entries = self
            .client
            .list(path)
            .await
            .map_err(|fault| translate(fault, path))?;
        entries.retain(|e| e.name != "." && e.name != "..");
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Map a command failure onto the taxonomy.
fn translate(fault: FtpFault, path: &str) -> FsError {
    match fault.code {
        Some(client::FILE_UNAVAILABLE) => FsError::not_found(path),
        Some(code) => FsError::Protocol {
            code: Some(code),
            message: fault.message,
        },
        None => FsError::io(path, std::io::Error::other(fault.message)),
    }
}

fn handshake_error(fault: FtpFault, config: &FtpConfig) -> FsError {
    match fault.code {
        Some(client::NOT_LOGGED_IN) => FsError::AuthenticationFailure {
            host: config.host.clone(),
            user: config.user.clone(),
            reason: fault.message,
        },
        _ => translate(fault, &config.host),
    }
}

#[async_trait]
impl RemoteTree for FtpFileSystem {
    async fn probe(&self, path: &str) -> FsResult<Option<FileType>> {
        self.exists(path).await
    }

    async fn children(&self, path: &str) -> FsResult<Vec<(String, FileType)>> {
        Ok(self
            .listing(path)
            .await?
            .into_iter()
            .map(|e| {
                let kind = FileType::from_discriminator(e.kind);
                (e.name, kind)
            })
            .collect())
    }

    async fn create_dir(&self, path: &str) -> FsResult<()> {
        self.client
            .mkdir(path)
            .await
            .map_err(|fault| translate(fault, path))
    }

    async fn remove_empty_dir(&self, path: &str) -> FsResult<()> {
        self.client
            .rmdir(path)
            .await
            .map_err(|fault| translate(fault, path))
    }

    async fn remove_file(&self, path: &str) -> FsResult<()> {
        self.client
            .delete(path)
            .await
            .map_err(|fault| translate(fault, path))
    }
}

#[async_trait]
impl FileSystem for FtpFileSystem {
    type Info = FtpFileInfo;

    async fn list(&self, path: &str) -> FsResult<Vec<FtpFileInfo>> {
        self.state.ensure_ready()?;
        tracing::debug!("ftp list {}", path);
        // LIST on a file answers with the file's own line
        match self.exists(path).await? {
            None => return Err(FsError::not_found(path)),
            Some(FileType::File) => {
                return Err(FsError::NotADirectory {
                    path: path.to_string(),
                });
            }
            Some(_) => {}
        }
        Ok(self
            .listing(path)
            .await?
            .into_iter()
            .map(FtpFileInfo::new)
            .collect())
    }

    async fn put(&self, source: ByteReader, to_path: &str) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("ftp put {}", to_path);
        self.client.store(to_path, source).await.map_err(|fault| match fault.code {
            // STOR refusals are write failures, not lookups
            Some(client::FILE_UNAVAILABLE) | None => {
                FsError::io(to_path, std::io::Error::other(fault.message))
            }
            Some(_) => translate(fault, to_path),
        })
    }

    async fn get(&self, path: &str) -> FsResult<Vec<u8>> {
        let mut stream = self.read_to_stream(path).await?;
        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .await
            .map_err(|e| FsError::io(path, e))?;
        Ok(buf)
    }

    async fn read_to_stream(&self, path: &str) -> FsResult<ByteReader> {
        self.state.ensure_ready()?;
        tracing::debug!("ftp retrieve {}", path);
        self.client
            .retrieve(path)
            .await
            .map_err(|fault| translate(fault, path))
    }

    async fn mkdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("ftp mkdir {} (recursive={})", path, recursive);
        tree::mkdir(self, path, recursive).await
    }

    async fn rmdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("ftp rmdir {} (recursive={})", path, recursive);
        tree::rmdir(self, path, recursive).await
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("ftp delete {}", path);
        match self.exists(path).await? {
            None => Err(FsError::not_found(path)),
            Some(FileType::Directory) => Err(FsError::IsADirectory {
                path: path.to_string(),
            }),
            Some(_) => self.remove_file(path).await,
        }
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> FsResult<()> {
        self.state.ensure_ready()?;
        tracing::debug!("ftp rename {} -> {}", old_path, new_path);
        match self.client.rename(old_path, new_path).await {
            Ok(()) => Ok(()),
            // 550 names neither side; blame the source only when it is gone
            Err(fault) if fault.is_file_unavailable() => match self.exists(old_path).await? {
                None => Err(FsError::not_found(old_path)),
                Some(_) => Err(FsError::not_found(new_path)),
            },
            Err(fault) => Err(translate(fault, old_path)),
        }
    }

    async fn exists(&self, path: &str) -> FsResult<Option<FileType>> {
        self.state.ensure_ready()?;
        let (parent, name) = path::split(path);
        let Some(name) = name else {
            // the root and the working directory always exist
            return Ok(Some(FileType::Directory));
        };
        let entries = match self.client.list(&parent).await {
            Ok(entries) => entries,
            Err(fault) if fault.is_file_unavailable() => return Ok(None),
            Err(fault) => return Err(translate(fault, path)),
        };
        let Some(found) = entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| FileType::from_discriminator(e.kind))
        else {
            return Ok(None);
        };
        // LIST on a file answers with the file's own line, so `/f/f` would
        // match when `/f` is a file
        if entries.len() == 1 && path::split(&parent).1.as_deref() == Some(name.as_str()) {
            return match self.exists(&parent).await? {
                Some(FileType::Directory) | Some(FileType::Link) => Ok(Some(found)),
                Some(FileType::File) | None => Ok(None),
            };
        }
        Ok(Some(found))
    }

    async fn close(&self) -> FsResult<()> {
        self.close_with(CloseMode::Graceful).await
    }
}
