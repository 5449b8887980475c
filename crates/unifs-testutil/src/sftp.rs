//! In-memory [`SftpClient`] answering with SFTP status codes.
//!
//! Missing entries are `SSH_FX_NO_SUCH_FILE`; every other refusal is the
//! generic `SSH_FX_FAILURE`, as OpenSSH reports them.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use unifs::fs::sftp::{FAILURE, NO_SUCH_FILE};
use unifs::{ByteReader, SftpClient, SftpFault, SftpListing};

use crate::stream::{chunked_reader, failing_reader};
use crate::tree::{MemoryTree, TreeError};

/// Fake SFTP subsystem over a [`MemoryTree`].
#[derive(Debug, Clone)]
pub struct MemorySftpClient {
    tree: Arc<MemoryTree>,
    fail_transfers_after: Arc<AtomicUsize>,
    next_fault: Arc<Mutex<Option<u32>>>,
    ends: Arc<AtomicUsize>,
}

impl MemorySftpClient {
    pub fn new(tree: Arc<MemoryTree>) -> Self {
        Self {
            tree,
            fail_transfers_after: Arc::new(AtomicUsize::new(usize::MAX)),
            next_fault: Arc::new(Mutex::new(None)),
            ends: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn tree(&self) -> &Arc<MemoryTree> {
        &self.tree
    }

    /// Answer the next command with `code`, whatever it asks for.
    pub fn fail_next_with(&self, code: u32) {
        *self.next_fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(code);
    }

    fn injected(&self, path: &str) -> Result<(), SftpFault> {
        let code = self.next_fault.lock().unwrap_or_else(|e| e.into_inner()).take();
        match code {
            Some(code) => Err(SftpFault::status(code, format!("{path}: injected status {code}"))),
            None => Ok(()),
        }
    }

    /// Fail every later streamed read after `bytes` bytes.
    pub fn fail_transfers_after(&self, bytes: usize) {
        self.fail_transfers_after.store(bytes, Ordering::SeqCst);
    }

    pub fn end_calls(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }
}

fn status(path: &str, err: TreeError) -> SftpFault {
    match err {
        TreeError::Missing | TreeError::MissingParent => {
            SftpFault::status(NO_SUCH_FILE, format!("{path}: No such file"))
        }
        _ => SftpFault::status(FAILURE, format!("{path}: Failure")),
    }
}

#[async_trait]
impl SftpClient for MemorySftpClient {
    async fn list(&self, path: &str) -> Result<Vec<SftpListing>, SftpFault> {
        self.injected(path)?;
        let entries = self.tree.list(path).map_err(|err| status(path, err))?;
        Ok(entries
            .into_iter()
            .map(|e| SftpListing {
                name: e.name,
                size: e.size,
                kind: e.kind,
            })
            .collect())
    }

    async fn exists(&self, path: &str) -> Result<Option<char>, SftpFault> {
        self.injected(path)?;
        Ok(self.tree.kind(path))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, SftpFault> {
        self.injected(path)?;
        self.tree.read(path).map_err(|err| status(path, err))
    }

    async fn open_read(&self, path: &str) -> Result<ByteReader, SftpFault> {
        self.injected(path)?;
        let data = self.tree.read(path).map_err(|err| status(path, err))?;
        let limit = self.fail_transfers_after.load(Ordering::SeqCst);
        if limit < data.len() {
            return Ok(failing_reader(data[..limit].to_vec(), "channel closed"));
        }
        Ok(chunked_reader(data, 32 * 1024))
    }

    async fn put(&self, path: &str, mut source: ByteReader) -> Result<(), SftpFault> {
        self.injected(path)?;
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .await
            .map_err(|e| SftpFault::transport(format!("write aborted: {e}")))?;
        self.tree.write(path, data).map_err(|err| status(path, err))
    }

    async fn mkdir(&self, path: &str) -> Result<(), SftpFault> {
        self.injected(path)?;
        self.tree.mkdir(path).map_err(|err| status(path, err))
    }

    async fn rmdir(&self, path: &str) -> Result<(), SftpFault> {
        self.injected(path)?;
        self.tree.rmdir(path).map_err(|err| status(path, err))
    }

    async fn delete(&self, path: &str) -> Result<(), SftpFault> {
        self.injected(path)?;
        self.tree.remove(path).map_err(|err| status(path, err))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), SftpFault> {
        self.injected(from)?;
        self.tree.rename(from, to).map_err(|err| status(from, err))
    }

    async fn end(&self) -> Result<(), SftpFault> {
        self.ends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
