//! [`FtpClient`] over `suppaftp`.
//!
//! `suppaftp::FtpStream` is a blocking client. Commands run on tokio's
//! blocking pool; the session mutex is the command queue, so commands (and
//! whole transfers) execute one at a time in the order they acquired it.

use std::io::{self, Read};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use suppaftp::list::File as ListLine;
use suppaftp::types::FileType as TransferType;
use suppaftp::{FtpError, FtpStream, Mode};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::{StreamReader, SyncIoBridge};

use super::client::{FtpClient, FtpFault, FtpListing};
use crate::config::FtpConfig;
use crate::fs::traits::ByteReader;

/// Bytes per chunk handed from the transfer thread to the reader.
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the transfer thread and the reader.
const CHUNK_QUEUE: usize = 8;

type Session = Arc<Mutex<Option<FtpStream>>>;

/// A connected `suppaftp` session.
pub struct SuppaFtpClient {
    session: Session,
    /// Clone of the control socket, for forced shutdown while a command
    /// holds the session.
    control: Option<TcpStream>,
}

impl SuppaFtpClient {
    /// Connect and log in. Blocks the calling thread.
    pub fn connect_blocking(config: &FtpConfig) -> Result<Self, FtpFault> {
        let options = &config.connection_options;
        let addr = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|e| FtpFault::transport(format!("resolve {}: {e}", config.host)))?
            .next()
            .ok_or_else(|| FtpFault::transport(format!("no address for {}", config.host)))?;

        let mut ftp = match options.connect_timeout() {
            Some(timeout) => FtpStream::connect_timeout(addr, timeout)?,
            None => FtpStream::connect(addr)?,
        };
        if let Some(timeout) = options.read_timeout() {
            ftp.get_ref()
                .set_read_timeout(Some(timeout))
                .map_err(|e| FtpFault::transport(e.to_string()))?;
        }

        ftp.login(config.user.as_str(), config.password.as_str())?;
        ftp.transfer_type(TransferType::Binary)?;
        ftp.set_mode(if options.passive {
            Mode::Passive
        } else {
            Mode::Active
        });

        let control = ftp.get_ref().try_clone().ok();
        tracing::info!("ftp session ready on {}:{}", config.host, config.port);
        Ok(Self {
            session: Arc::new(Mutex::new(Some(ftp))),
            control,
        })
    }

    /// Run one command against the session on the blocking pool.
    async fn run<T, F>(&self, command: F) -> Result<T, FtpFault>
    where
        T: Send + 'static,
        F: FnOnce(&mut FtpStream) -> Result<T, FtpError> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|_| FtpFault::transport("ftp session poisoned"))?;
            let ftp = guard
                .as_mut()
                .ok_or_else(|| FtpFault::transport("ftp session closed"))?;
            command(ftp).map_err(FtpFault::from)
        })
        .await
        .map_err(|e| FtpFault::transport(format!("ftp command task failed: {e}")))?
    }
}

impl From<FtpError> for FtpFault {
    fn from(err: FtpError) -> Self {
        match err {
            FtpError::UnexpectedResponse(response) => FtpFault::reply(
                response.status.code(),
                String::from_utf8_lossy(&response.body).trim().to_string(),
            ),
            other => FtpFault::transport(other.to_string()),
        }
    }
}

fn listing_from_line(line: &str) -> Option<FtpListing> {
    let parsed: ListLine = match line.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!("skipping unparsable LIST line: {:?}", line);
            return None;
        }
    };
    let kind = if parsed.is_directory() {
        'd'
    } else if parsed.is_symlink() {
        'l'
    } else {
        '-'
    };
    Some(FtpListing {
        name: parsed.name().to_string(),
        size: parsed.size() as u64,
        kind,
    })
}

#[async_trait]
impl FtpClient for SuppaFtpClient {
    async fn list(&self, path: &str) -> Result<Vec<FtpListing>, FtpFault> {
        let path = path.to_string();
        let lines = self.run(move |ftp| ftp.list(Some(path.as_str()))).await?;
        Ok(lines.iter().filter_map(|l| listing_from_line(l)).collect())
    }

    async fn retrieve(&self, path: &str) -> Result<ByteReader, FtpFault> {
        let (chunks_tx, chunks_rx) = mpsc::channel::<io::Result<Bytes>>(CHUNK_QUEUE);
        let (opened_tx, opened_rx) = oneshot::channel::<Result<(), FtpFault>>();
        let session = Arc::clone(&self.session);
        let path = path.to_string();

        // The transfer owns the session until the data connection is drained
        // and the closing reply has been read.
        tokio::task::spawn_blocking(move || {
            let mut guard = match session.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    let _ = opened_tx.send(Err(FtpFault::transport("ftp session poisoned")));
                    return;
                }
            };
            let Some(ftp) = guard.as_mut() else {
                let _ = opened_tx.send(Err(FtpFault::transport("ftp session closed")));
                return;
            };
            let mut data = match ftp.retr_as_stream(&path) {
                Ok(data) => {
                    let _ = opened_tx.send(Ok(()));
                    data
                }
                Err(e) => {
                    let _ = opened_tx.send(Err(e.into()));
                    return;
                }
            };

            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                match data.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let chunk = Bytes::copy_from_slice(&buf[..n]);
                        if chunks_tx.blocking_send(Ok(chunk)).is_err() {
                            tracing::debug!("ftp retrieve of {} abandoned by reader", path);
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = chunks_tx.blocking_send(Err(e));
                        break;
                    }
                }
            }
            if let Err(e) = ftp.finalize_retr_stream(data) {
                let _ = chunks_tx.blocking_send(Err(io::Error::other(e.to_string())));
            }
        });

        opened_rx
            .await
            .map_err(|_| FtpFault::transport("ftp transfer task ended before opening"))??;
        Ok(Box::pin(StreamReader::new(ReceiverStream::new(chunks_rx))))
    }

    async fn store(&self, path: &str, source: ByteReader) -> Result<(), FtpFault> {
        let path = path.to_string();
        self.run(move |ftp| {
            let mut reader = SyncIoBridge::new(source);
            ftp.put_file(path.as_str(), &mut reader).map(|_| ())
        })
        .await
    }

    async fn mkdir(&self, path: &str) -> Result<(), FtpFault> {
        let path = path.to_string();
        self.run(move |ftp| ftp.mkdir(path.as_str())).await
    }

    async fn rmdir(&self, path: &str) -> Result<(), FtpFault> {
        let path = path.to_string();
        self.run(move |ftp| ftp.rmdir(path.as_str())).await
    }

    async fn delete(&self, path: &str) -> Result<(), FtpFault> {
        let path = path.to_string();
        self.run(move |ftp| ftp.rm(path.as_str())).await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FtpFault> {
        let (from, to) = (from.to_string(), to.to_string());
        self.run(move |ftp| ftp.rename(from.as_str(), to.as_str())).await
    }

    async fn end(&self) -> Result<(), FtpFault> {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = session
                .lock()
                .map_err(|_| FtpFault::transport("ftp session poisoned"))?;
            match guard.take() {
                Some(mut ftp) => ftp.quit().map_err(FtpFault::from),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| FtpFault::transport(format!("ftp quit task failed: {e}")))?
    }

    async fn destroy(&self) {
        if let Some(control) = &self.control
            && let Err(e) = control.shutdown(Shutdown::Both)
        {
            tracing::debug!("ftp control socket shutdown: {}", e);
        }
        // A command still holding the session fails on the dead socket and
        // releases it; whoever gets the lock next finds the session gone.
        if let Ok(mut guard) = self.session.try_lock() {
            guard.take();
        }
    }
}
