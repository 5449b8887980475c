//! In-memory directory tree shared by the fake collaborators.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use unifs::path;

/// Node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(Vec<u8>),
    Directory,
    /// Symbolic link; the target is recorded, never followed.
    Link(String),
}

impl Node {
    /// Listing discriminator: `-`, `d` or `l`.
    pub fn kind(&self) -> char {
        match self {
            Node::File(_) => '-',
            Node::Directory => 'd',
            Node::Link(_) => 'l',
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Node::File(data) => data.len() as u64,
            Node::Directory => 4096,
            Node::Link(target) => target.len() as u64,
        }
    }
}

/// Why a tree operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    Missing,
    MissingParent,
    Exists,
    NotADirectory,
    IsADirectory,
    NotEmpty,
}

/// One entry of [`MemoryTree::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listed {
    pub name: String,
    pub size: u64,
    pub kind: char,
}

/// Flat map of absolute path → node. `/` always exists.
#[derive(Debug)]
pub struct MemoryTree {
    nodes: Mutex<BTreeMap<String, Node>>,
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Directory);
        Self {
            nodes: Mutex::new(nodes),
        }
    }

    /// Absolute, normalized key. Relative paths resolve against `/`.
    pub fn key(p: &str) -> String {
        let normalized = path::normalize(p);
        if normalized.starts_with('/') {
            normalized
        } else {
            path::normalize(&format!("/{normalized}"))
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Node>> {
        match self.nodes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seed a file, creating missing parents.
    pub fn insert_file(&self, p: &str, data: impl Into<Vec<u8>>) {
        self.seed(p, Node::File(data.into()));
    }

    /// Seed a link, creating missing parents.
    pub fn insert_link(&self, p: &str, target: &str) {
        self.seed(p, Node::Link(target.to_string()));
    }

    /// Seed a directory, creating missing parents.
    pub fn insert_dir(&self, p: &str) {
        self.seed(p, Node::Directory);
    }

    fn seed(&self, p: &str, node: Node) {
        let key = Self::key(p);
        let mut nodes = self.lock();
        let (parent, _) = path::split(&key);
        for dir in path::ancestors(&parent) {
            nodes.entry(dir).or_insert(Node::Directory);
        }
        nodes.insert(key, node);
    }

    pub fn get(&self, p: &str) -> Option<Node> {
        self.lock().get(&Self::key(p)).cloned()
    }

    pub fn kind(&self, p: &str) -> Option<char> {
        self.get(p).map(|node| node.kind())
    }

    /// Direct children of a directory, sorted by name.
    pub fn list(&self, p: &str) -> Result<Vec<Listed>, TreeError> {
        let key = Self::key(p);
        let nodes = self.lock();
        match nodes.get(&key) {
            None => return Err(TreeError::Missing),
            Some(Node::Directory) => {}
            Some(_) => return Err(TreeError::NotADirectory),
        }
        Ok(children(&nodes, &key)
            .map(|(child, node)| Listed {
                name: path::split(child).1.unwrap_or_default(),
                size: node.size(),
                kind: node.kind(),
            })
            .collect())
    }

    pub fn read(&self, p: &str) -> Result<Vec<u8>, TreeError> {
        match self.lock().get(&Self::key(p)) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Directory) => Err(TreeError::IsADirectory),
            // links are not followed
            Some(Node::Link(_)) => Err(TreeError::Missing),
            None => Err(TreeError::Missing),
        }
    }

    pub fn write(&self, p: &str, data: Vec<u8>) -> Result<(), TreeError> {
        let key = Self::key(p);
        let mut nodes = self.lock();
        require_parent(&nodes, &key)?;
        if let Some(Node::Directory) = nodes.get(&key) {
            return Err(TreeError::IsADirectory);
        }
        nodes.insert(key, Node::File(data));
        Ok(())
    }

    pub fn mkdir(&self, p: &str) -> Result<(), TreeError> {
        let key = Self::key(p);
        let mut nodes = self.lock();
        if nodes.contains_key(&key) {
            return Err(TreeError::Exists);
        }
        require_parent(&nodes, &key)?;
        nodes.insert(key, Node::Directory);
        Ok(())
    }

    pub fn rmdir(&self, p: &str) -> Result<(), TreeError> {
        let key = Self::key(p);
        let mut nodes = self.lock();
        match nodes.get(&key) {
            None => return Err(TreeError::Missing),
            Some(Node::Directory) => {}
            Some(_) => return Err(TreeError::NotADirectory),
        }
        if key == "/" {
            return Err(TreeError::NotEmpty);
        }
        if children(&nodes, &key).next().is_some() {
            return Err(TreeError::NotEmpty);
        }
        nodes.remove(&key);
        Ok(())
    }

    pub fn remove(&self, p: &str) -> Result<(), TreeError> {
        let key = Self::key(p);
        let mut nodes = self.lock();
        match nodes.get(&key) {
            None => Err(TreeError::Missing),
            Some(Node::Directory) => Err(TreeError::IsADirectory),
            Some(_) => {
                nodes.remove(&key);
                Ok(())
            }
        }
    }

    /// Move an entry and, for directories, everything below it.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), TreeError> {
        let from = Self::key(from);
        let to = Self::key(to);
        let mut nodes = self.lock();
        if !nodes.contains_key(&from) || from == "/" {
            return Err(TreeError::Missing);
        }
        require_parent(&nodes, &to)?;
        if from == to {
            return Ok(());
        }
        if let Some(Node::Directory) = nodes.get(&to) {
            return Err(TreeError::IsADirectory);
        }

        let prefix = format!("{from}/");
        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| **k == from || k.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }
}

fn children<'a>(
    nodes: &'a BTreeMap<String, Node>,
    dir: &'a str,
) -> impl Iterator<Item = (&'a String, &'a Node)> + 'a {
    nodes.iter().filter(move |(child, _)| {
        child.as_str() != dir && path::split(child).0 == dir
    })
}

fn require_parent(nodes: &BTreeMap<String, Node>, key: &str) -> Result<(), TreeError> {
    let (parent, _) = path::split(key);
    match nodes.get(&parent) {
        Some(Node::Directory) => Ok(()),
        Some(_) => Err(TreeError::NotADirectory),
        None => Err(TreeError::MissingParent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_parents_exist() {
        let tree = MemoryTree::new();
        tree.insert_file("/a/b/c.txt", "hi");
        assert_eq!(tree.kind("/a"), Some('d'));
        assert_eq!(tree.kind("/a/b"), Some('d'));
        assert_eq!(tree.kind("/a/b/c.txt"), Some('-'));
    }

    #[test]
    fn test_list_direct_children_only() {
        let tree = MemoryTree::new();
        tree.insert_file("/a/x.txt", "1");
        tree.insert_file("/a/sub/y.txt", "22");
        tree.insert_link("/a/latest", "/a/x.txt");

        let names: Vec<_> = tree.list("/a").unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["latest", "sub", "x.txt"]);
        assert_eq!(tree.list("/a/x.txt"), Err(TreeError::NotADirectory));
        assert_eq!(tree.list("/nope"), Err(TreeError::Missing));
    }

    #[test]
    fn test_mkdir_needs_parent() {
        let tree = MemoryTree::new();
        assert_eq!(tree.mkdir("/a/b"), Err(TreeError::MissingParent));
        tree.mkdir("/a").unwrap();
        assert_eq!(tree.mkdir("/a"), Err(TreeError::Exists));
        tree.mkdir("/a/b").unwrap();
    }

    #[test]
    fn test_rmdir_refuses_non_empty() {
        let tree = MemoryTree::new();
        tree.insert_file("/a/b.txt", "x");
        assert_eq!(tree.rmdir("/a"), Err(TreeError::NotEmpty));
        tree.remove("/a/b.txt").unwrap();
        tree.rmdir("/a").unwrap();
        assert_eq!(tree.kind("/a"), None);
    }

    #[test]
    fn test_rename_moves_subtree() {
        let tree = MemoryTree::new();
        tree.insert_file("/a/inner/f.txt", "data");
        tree.insert_file("/ab", "not a child of /a");
        tree.rename("/a", "/b").unwrap();

        assert_eq!(tree.kind("/a"), None);
        assert_eq!(tree.read("/b/inner/f.txt").unwrap(), b"data");
        assert_eq!(tree.read("/ab").unwrap(), b"not a child of /a");
    }

    #[test]
    fn test_relative_paths_resolve_from_root() {
        let tree = MemoryTree::new();
        tree.insert_file("docs/readme", "r");
        assert_eq!(tree.kind("/docs/readme"), Some('-'));
        assert_eq!(MemoryTree::key("."), "/");
    }
}
