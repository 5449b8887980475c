//! In-memory [`FtpClient`] that answers like a typical Unix FTP server.
//!
//! Every refusal is a `550`, whatever the cause. `LIST` on a file answers
//! with the file's own line.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use unifs::fs::ftp::FILE_UNAVAILABLE;
use unifs::{ByteReader, FtpClient, FtpFault, FtpListing};

use crate::stream::{chunked_reader, failing_reader};
use crate::tree::{Listed, MemoryTree, TreeError};

/// Fake FTP session over a [`MemoryTree`].
#[derive(Debug, Clone)]
pub struct MemoryFtpClient {
    tree: Arc<MemoryTree>,
    fail_transfers_after: Arc<AtomicUsize>,
    next_fault: Arc<Mutex<Option<u32>>>,
    quit_fails: Arc<AtomicBool>,
    ends: Arc<AtomicUsize>,
    destroys: Arc<AtomicUsize>,
}

impl MemoryFtpClient {
    pub fn new(tree: Arc<MemoryTree>) -> Self {
        Self {
            tree,
            fail_transfers_after: Arc::new(AtomicUsize::new(usize::MAX)),
            next_fault: Arc::new(Mutex::new(None)),
            quit_fails: Arc::new(AtomicBool::new(false)),
            ends: Arc::new(AtomicUsize::new(0)),
            destroys: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn tree(&self) -> &Arc<MemoryTree> {
        &self.tree
    }

    /// Answer the next command with `code`, whatever it asks for.
    pub fn fail_next_with(&self, code: u32) {
        *self.next_fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(code);
    }

    fn injected(&self, path: &str) -> Result<(), FtpFault> {
        let code = self.next_fault.lock().unwrap_or_else(|e| e.into_inner()).take();
        match code {
            Some(code) => Err(FtpFault::reply(code, format!("{path}: injected reply {code}"))),
            None => Ok(()),
        }
    }

    /// Break the data connection of every later `RETR` after `bytes` bytes.
    pub fn fail_transfers_after(&self, bytes: usize) {
        self.fail_transfers_after.store(bytes, Ordering::SeqCst);
    }

    /// Make `QUIT` fail.
    pub fn fail_quit(&self) {
        self.quit_fails.store(true, Ordering::SeqCst);
    }

    /// How many times `end` was called.
    pub fn end_calls(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    /// How many times `destroy` was called.
    pub fn destroy_calls(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }
}

fn refused(path: &str, err: TreeError) -> FtpFault {
    let reason = match err {
        TreeError::Missing | TreeError::MissingParent => "No such file or directory",
        TreeError::Exists => "File exists",
        TreeError::NotADirectory => "Not a directory",
        TreeError::IsADirectory => "Is a directory",
        TreeError::NotEmpty => "Directory not empty",
    };
    FtpFault::reply(FILE_UNAVAILABLE, format!("{path}: {reason}"))
}

fn listing(entry: Listed) -> FtpListing {
    FtpListing {
        name: entry.name,
        size: entry.size,
        kind: entry.kind,
    }
}

#[async_trait]
impl FtpClient for MemoryFtpClient {
    async fn list(&self, path: &str) -> Result<Vec<FtpListing>, FtpFault> {
        self.injected(path)?;
        match self.tree.list(path) {
            Ok(entries) => Ok(entries.into_iter().map(listing).collect()),
            Err(TreeError::NotADirectory) => {
                let name = unifs::path::split(&MemoryTree::key(path))
                    .1
                    .unwrap_or_default();
                let node = self.tree.get(path);
                Ok(node
                    .map(|node| FtpListing {
                        name,
                        size: node.size(),
                        kind: node.kind(),
                    })
                    .into_iter()
                    .collect())
            }
            Err(err) => Err(refused(path, err)),
        }
    }

    async fn retrieve(&self, path: &str) -> Result<ByteReader, FtpFault> {
        self.injected(path)?;
        let data = self.tree.read(path).map_err(|err| refused(path, err))?;
        let limit = self.fail_transfers_after.load(Ordering::SeqCst);
        if limit < data.len() {
            return Ok(failing_reader(data[..limit].to_vec(), "data connection reset"));
        }
        Ok(chunked_reader(data, 16 * 1024))
    }

    async fn store(&self, path: &str, mut source: ByteReader) -> Result<(), FtpFault> {
        self.injected(path)?;
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .await
            .map_err(|e| FtpFault::transport(format!("transfer aborted: {e}")))?;
        self.tree.write(path, data).map_err(|err| refused(path, err))
    }

    async fn mkdir(&self, path: &str) -> Result<(), FtpFault> {
        self.injected(path)?;
        self.tree.mkdir(path).map_err(|err| refused(path, err))
    }

    async fn rmdir(&self, path: &str) -> Result<(), FtpFault> {
        self.injected(path)?;
        self.tree.rmdir(path).map_err(|err| refused(path, err))
    }

    async fn delete(&self, path: &str) -> Result<(), FtpFault> {
        self.injected(path)?;
        self.tree.remove(path).map_err(|err| refused(path, err))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), FtpFault> {
        self.injected(from)?;
        self.tree.rename(from, to).map_err(|err| refused(from, err))
    }

    async fn end(&self) -> Result<(), FtpFault> {
        self.ends.fetch_add(1, Ordering::SeqCst);
        if self.quit_fails.load(Ordering::SeqCst) {
            return Err(FtpFault::reply(421, "Service not available"));
        }
        Ok(())
    }

    async fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}
