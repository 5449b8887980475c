//! Test utilities for unifs.
//!
//! In-memory stand-ins for the native protocol clients, so the FTP and SFTP
//! adapters can be exercised without a server:
//! - [`MemoryTree`]: the shared directory tree
//! - [`MemoryFtpClient`]: answers with FTP reply codes (`550` for every refusal)
//! - [`MemorySftpClient`]: answers with SFTP status codes
//! - [`chunked_reader`], [`failing_reader`]: byte streams for transfers

pub mod ftp;
pub mod sftp;
pub mod stream;
pub mod tree;

pub use ftp::MemoryFtpClient;
pub use sftp::MemorySftpClient;
pub use stream::{chunked_reader, failing_reader, payload};
pub use tree::{Listed, MemoryTree, Node, TreeError};
