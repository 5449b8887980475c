//! Entry metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of directory entry.
///
/// Closed on purpose: device nodes, sockets, pipes and any other exotic
/// entry a backend reports are classified as `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
    Link,
}

impl FileType {
    /// Map a native single-character type discriminator (`-`, `d`, `l`).
    ///
    /// Both the FTP listing parser and the SFTP client report entry kinds
    /// this way. Unrecognized characters map to `File`.
    pub fn from_discriminator(code: char) -> Self {
        match code {
            'd' => FileType::Directory,
            'l' => FileType::Link,
            _ => FileType::File,
        }
    }

    /// The native discriminator for this kind.
    pub fn discriminator(self) -> char {
        match self {
            FileType::File => '-',
            FileType::Directory => 'd',
            FileType::Link => 'l',
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileType::File => "file",
            FileType::Directory => "directory",
            FileType::Link => "link",
        };
        f.write_str(label)
    }
}

/// Read-only projection over one backend's listing metadata.
///
/// Each backend has its own implementation wrapping the native record.
/// Values are created per `list` call and own no resources.
pub trait FileInfo {
    /// Base name of the entry (never a path).
    fn name(&self) -> &str;

    /// Size in bytes. Backend-dependent for directories.
    fn size(&self) -> u64;

    /// Kind of entry.
    fn file_type(&self) -> FileType;

    /// Whether this entry is a directory.
    fn is_directory(&self) -> bool {
        self.file_type() == FileType::Directory
    }
}

/// A backend-neutral directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Kind of entry.
    pub file_type: FileType,
}

impl DirEntry {
    /// Create a new file entry.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            file_type: FileType::File,
        }
    }

    /// Create a new directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            file_type: FileType::Directory,
        }
    }

    /// Copy the shape of any backend's entry.
    pub fn from_info(info: &impl FileInfo) -> Self {
        Self {
            name: info.name().to_string(),
            size: info.size(),
            file_type: info.file_type(),
        }
    }
}

impl FileInfo for DirEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn file_type(&self) -> FileType {
        self.file_type
    }
}
