//! Directory-tree operations built from single-entry protocol primitives.
//!
//! FTP and SFTP only create or remove one directory per command and report
//! most failures with one generic status. The remote adapters implement
//! [`RemoteTree`] over their collaborator and get `mkdir`/`rmdir` with the
//! full contract semantics from here.

use async_trait::async_trait;
use unifs_types::{FileType, FsError, FsResult};

use crate::path;

#[async_trait]
pub(crate) trait RemoteTree: Send + Sync {
    /// Kind of the entry at `path`, `None` if absent.
    async fn probe(&self, path: &str) -> FsResult<Option<FileType>>;

    /// Direct children of a directory.
    async fn children(&self, path: &str) -> FsResult<Vec<(String, FileType)>>;

    async fn create_dir(&self, path: &str) -> FsResult<()>;

    async fn remove_empty_dir(&self, path: &str) -> FsResult<()>;

    async fn remove_file(&self, path: &str) -> FsResult<()>;
}

pub(crate) async fn mkdir<T>(tree: &T, target: &str, recursive: bool) -> FsResult<()>
where
    T: RemoteTree + ?Sized,
{
    if recursive {
        for dir in path::ancestors(target) {
            match tree.probe(&dir).await? {
                // Links are trusted to point at directories; the server
                // rejects the next level if they don't.
                Some(FileType::Directory) | Some(FileType::Link) => {}
                // the target itself exists as a non-directory
                Some(FileType::File) if dir == path::normalize(target) => {
                    return Err(FsError::AlreadyExists { path: dir });
                }
                Some(FileType::File) => return Err(FsError::NotADirectory { path: dir }),
                None => tree.create_dir(&dir).await?,
            }
        }
        return Ok(());
    }

    if tree.probe(target).await?.is_some() {
        return Err(FsError::AlreadyExists {
            path: target.to_string(),
        });
    }
    let (parent, _) = path::split(target);
    match tree.probe(&parent).await? {
        None => Err(FsError::not_found(parent)),
        Some(FileType::File) => Err(FsError::NotADirectory { path: parent }),
        Some(_) => tree.create_dir(target).await,
    }
}

pub(crate) async fn rmdir<T>(tree: &T, target: &str, recursive: bool) -> FsResult<()>
where
    T: RemoteTree + ?Sized,
{
    match tree.probe(target).await? {
        None => return Err(FsError::not_found(target)),
        Some(FileType::Directory) => {}
        Some(_) => {
            return Err(FsError::NotADirectory {
                path: target.to_string(),
            });
        }
    }

    if !recursive {
        if !tree.children(target).await?.is_empty() {
            return Err(FsError::NotEmpty {
                path: target.to_string(),
            });
        }
        return tree.remove_empty_dir(target).await;
    }

    // Files go as they are found; directories are removed afterwards in
    // reverse discovery order so every child precedes its parent.
    let mut pending = vec![target.to_string()];
    let mut dirs = Vec::new();
    while let Some(dir) = pending.pop() {
        for (name, kind) in tree.children(&dir).await? {
            let child = path::join(&dir, &name);
            match kind {
                FileType::Directory => pending.push(child),
                FileType::File | FileType::Link => tree.remove_file(&child).await?,
            }
        }
        dirs.push(dir);
    }
    for dir in dirs.iter().rev() {
        tree.remove_empty_dir(dir).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Flat map of path → kind; just enough structure for the algorithms.
    struct FakeTree {
        entries: Mutex<BTreeMap<String, FileType>>,
        log: Mutex<Vec<String>>,
    }

    impl FakeTree {
        fn new(entries: &[(&str, FileType)]) -> Self {
            let mut map = BTreeMap::new();
            map.insert("/".to_string(), FileType::Directory);
            for (path, kind) in entries {
                map.insert(path.to_string(), *kind);
            }
            Self {
                entries: Mutex::new(map),
                log: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, op: &str, path: &str) {
            self.log.lock().unwrap().push(format!("{op} {path}"));
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteTree for FakeTree {
        async fn probe(&self, path: &str) -> FsResult<Option<FileType>> {
            Ok(self.entries.lock().unwrap().get(path).copied())
        }

        async fn children(&self, dir: &str) -> FsResult<Vec<(String, FileType)>> {
            let entries = self.entries.lock().unwrap();
            Ok(entries
                .iter()
                .filter(|(p, _)| p.as_str() != dir)
                .filter_map(|(p, kind)| {
                    let (parent, name) = path::split(p);
                    (parent == dir).then(|| (name.unwrap_or_default(), *kind))
                })
                .collect())
        }

        async fn create_dir(&self, path: &str) -> FsResult<()> {
            self.record("mkdir", path);
            self.entries
                .lock()
                .unwrap()
                .insert(path.to_string(), FileType::Directory);
            Ok(())
        }

        async fn remove_empty_dir(&self, path: &str) -> FsResult<()> {
            self.record("rmdir", path);
            self.entries.lock().unwrap().remove(path);
            Ok(())
        }

        async fn remove_file(&self, path: &str) -> FsResult<()> {
            self.record("rm", path);
            self.entries.lock().unwrap().remove(path);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_recursive_mkdir_creates_only_missing_levels() {
        let tree = FakeTree::new(&[("/a", FileType::Directory)]);
        mkdir(&tree, "/a/b/c", true).await.unwrap();
        assert_eq!(tree.log(), vec!["mkdir /a/b", "mkdir /a/b/c"]);
    }

    #[tokio::test]
    async fn test_recursive_mkdir_through_file_fails() {
        let tree = FakeTree::new(&[("/a", FileType::File)]);
        let err = mkdir(&tree, "/a/b", true).await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { ref path } if path == "/a"));
    }

    #[tokio::test]
    async fn test_recursive_mkdir_over_file_already_exists() {
        let tree = FakeTree::new(&[("/a", FileType::Directory), ("/a/f", FileType::File)]);
        let err = mkdir(&tree, "/a/f", true).await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists { ref path } if path == "/a/f"));
        assert!(tree.log().is_empty());
    }

    #[tokio::test]
    async fn test_plain_mkdir_missing_parent() {
        let tree = FakeTree::new(&[]);
        let err = mkdir(&tree, "/a/b", false).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound { ref path } if path == "/a"));
        assert!(tree.log().is_empty());
    }

    #[tokio::test]
    async fn test_recursive_rmdir_removes_children_first() {
        let tree = FakeTree::new(&[
            ("/a", FileType::Directory),
            ("/a/x.txt", FileType::File),
            ("/a/sub", FileType::Directory),
            ("/a/sub/y.txt", FileType::File),
            ("/a/link", FileType::Link),
        ]);
        rmdir(&tree, "/a", true).await.unwrap();

        let log = tree.log();
        let position = |entry: &str| log.iter().position(|l| l == entry).unwrap();
        assert!(position("rm /a/sub/y.txt") < position("rmdir /a/sub"));
        assert!(position("rmdir /a/sub") < position("rmdir /a"));
        assert!(log.contains(&"rm /a/link".to_string()));
        assert_eq!(tree.probe("/a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rmdir_on_file() {
        let tree = FakeTree::new(&[("/f", FileType::File)]);
        let err = rmdir(&tree, "/f", false).await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));
    }
}
