//! Local filesystem backend.
//!
//! Operates on host paths, or on paths confined under a root directory.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use unifs_types::{FileInfo, FileType, FsError, FsResult};

use super::traits::{ByteReader, FileSystem};

/// Entry produced by [`LocalFileSystem::list`].
#[derive(Debug, Clone)]
pub struct LocalFileInfo {
    name: String,
    original: Metadata,
}

impl LocalFileInfo {
    /// The native metadata, as reported without following symlinks.
    pub fn original(&self) -> &Metadata {
        &self.original
    }

    /// Classify metadata obtained with `symlink_metadata`.
    ///
    /// Sockets, pipes and devices are classified as `File`.
    pub fn kind_of(meta: &Metadata) -> FileType {
        let file_type = meta.file_type();
        if file_type.is_symlink() {
            FileType::Link
        } else if file_type.is_dir() {
            FileType::Directory
        } else {
            FileType::File
        }
    }
}

impl FileInfo for LocalFileInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.original.len()
    }

    fn file_type(&self) -> FileType {
        Self::kind_of(&self.original)
    }

    fn is_directory(&self) -> bool {
        self.original.file_type().is_dir()
    }
}

/// Local filesystem backend.
///
/// [`create`](Self::create) uses paths as given. [`rooted`](Self::rooted)
/// treats every path as relative to `root`: `/a/b.txt` and `a/b.txt` both
/// name `root/a/b.txt`, and `..` cannot climb above `root`.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    root: Option<PathBuf>,
}

impl LocalFileSystem {
    /// Create an unconfined local filesystem. No handshake is involved.
    pub fn create() -> Self {
        Self { root: None }
    }

    /// Create a local filesystem confined under `root`.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Map a contract path onto a host path.
    ///
    /// Under a root, components are normalized without touching the disk so
    /// that symlinks are never followed during resolution.
    fn resolve(&self, path: &str) -> FsResult<PathBuf> {
        let Some(root) = &self.root else {
            return Ok(PathBuf::from(path));
        };

        let mut normalized = root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::ParentDir => {
                    if normalized == *root {
                        return Err(FsError::io(
                            path,
                            io::Error::new(io::ErrorKind::PermissionDenied, "path escapes root"),
                        ));
                    }
                    normalized.pop();
                }
                Component::Normal(c) => normalized.push(c),
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            }
        }
        Ok(normalized)
    }

    async fn lstat(&self, host: &Path, path: &str) -> FsResult<Metadata> {
        fs::symlink_metadata(host)
            .await
            .map_err(|e| FsError::from_io(e, path))
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    type Info = LocalFileInfo;

    async fn list(&self, path: &str) -> FsResult<Vec<LocalFileInfo>> {
        tracing::debug!("local list {}", path);
        let full_path = self.resolve(path)?;
        let mut dir = fs::read_dir(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(e, path))?
        {
            // Use symlink_metadata to detect symlinks without following them
            let name = entry.file_name().to_string_lossy().into_owned();
            let original = fs::symlink_metadata(entry.path())
                .await
                .map_err(|e| FsError::from_io(e, format!("{}/{}", path.trim_end_matches('/'), name)))?;
            entries.push(LocalFileInfo { name, original });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn put(&self, mut source: ByteReader, to_path: &str) -> FsResult<()> {
        tracing::debug!("local put {}", to_path);
        let full_path = self.resolve(to_path)?;
        let mut file = fs::File::create(&full_path)
            .await
            .map_err(|e| FsError::io(to_path, e))?;

        tokio::io::copy(&mut source, &mut file)
            .await
            .map_err(|e| FsError::io(to_path, e))?;
        file.flush().await.map_err(|e| FsError::io(to_path, e))?;
        file.sync_all().await.map_err(|e| FsError::io(to_path, e))
    }

    async fn get(&self, path: &str) -> FsResult<Vec<u8>> {
        tracing::debug!("local get {}", path);
        let full_path = self.resolve(path)?;
        fs::read(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))
    }

    async fn read_to_stream(&self, path: &str) -> FsResult<ByteReader> {
        tracing::debug!("local read_to_stream {}", path);
        let full_path = self.resolve(path)?;
        if self.lstat(&full_path, path).await?.is_dir() {
            return Err(FsError::IsADirectory {
                path: path.to_string(),
            });
        }
        let file = fs::File::open(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))?;
        Ok(Box::pin(file))
    }

    async fn mkdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        tracing::debug!("local mkdir {} (recursive={})", path, recursive);
        let full_path = self.resolve(path)?;
        let result = if recursive {
            fs::create_dir_all(&full_path).await
        } else {
            fs::create_dir(&full_path).await
        };
        result.map_err(|e| FsError::from_io(e, path))
    }

    async fn rmdir(&self, path: &str, recursive: bool) -> FsResult<()> {
        tracing::debug!("local rmdir {} (recursive={})", path, recursive);
        let full_path = self.resolve(path)?;
        if !self.lstat(&full_path, path).await?.is_dir() {
            return Err(FsError::NotADirectory {
                path: path.to_string(),
            });
        }
        let result = if recursive {
            fs::remove_dir_all(&full_path).await
        } else {
            fs::remove_dir(&full_path).await
        };
        result.map_err(|e| FsError::from_io(e, path))
    }

    async fn delete(&self, path: &str) -> FsResult<()> {
        tracing::debug!("local delete {}", path);
        let full_path = self.resolve(path)?;
        if self.lstat(&full_path, path).await?.is_dir() {
            return Err(FsError::IsADirectory {
                path: path.to_string(),
            });
        }
        fs::remove_file(&full_path)
            .await
            .map_err(|e| FsError::from_io(e, path))
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> FsResult<()> {
        tracing::debug!("local rename {} -> {}", old_path, new_path);
        let from = self.resolve(old_path)?;
        let to = self.resolve(new_path)?;
        let Err(e) = fs::rename(&from, &to).await else {
            return Ok(());
        };
        // rename reports a missing source and a missing target parent alike
        if e.kind() == io::ErrorKind::NotFound && self.exists(old_path).await?.is_none() {
            return Err(FsError::not_found(old_path));
        }
        Err(FsError::from_io(e, new_path))
    }

    async fn exists(&self, path: &str) -> FsResult<Option<FileType>> {
        let full_path = self.resolve(path)?;
        match fs::symlink_metadata(&full_path).await {
            Ok(meta) => Ok(Some(LocalFileInfo::kind_of(&meta))),
            // a file somewhere along the path means absent too
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                Ok(None)
            }
            Err(e) => Err(FsError::io(path, e)),
        }
    }

    async fn close(&self) -> FsResult<()> {
        Ok(())
    }
}
