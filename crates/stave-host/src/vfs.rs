//! In-memory virtual directory tree with preopened mounts.
//!
//! The guest sees a tiny filesystem: a handful of preopened roots, each an
//! ordered tree of named files and subdirectories. The tree is owned
//! exclusively by the session controller; its observable contents are
//! request-scoped (cleared on every reload) even though the mount objects
//! themselves are reused.

use std::collections::BTreeMap;

/// Snapshot of every leaf reachable from the mount roots: slash-joined
/// relative path to raw content.
pub type FileSnapshot = BTreeMap<String, Vec<u8>>;

/// One entry in a directory: a leaf file or a nested directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Raw byte content.
    File(Vec<u8>),
    /// A nested directory.
    Dir(DirTree),
}

/// An ordered mapping from name to file or subdirectory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirTree {
    entries: BTreeMap<String, Node>,
}

impl DirTree {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file directly under this directory.
    pub fn insert_file(&mut self, name: impl Into<String>, content: Vec<u8>) {
        self.entries.insert(name.into(), Node::File(content));
    }

    /// Insert or replace a subdirectory.
    pub fn insert_dir(&mut self, name: impl Into<String>, dir: DirTree) {
        self.entries.insert(name.into(), Node::Dir(dir));
    }

    /// Look up an immediate child.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    /// Iterate immediate children in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// True when the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn flatten_into(&self, prefix: &str, out: &mut FileSnapshot) {
        for (name, node) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            match node {
                Node::File(content) => {
                    out.insert(path, content.clone());
                }
                Node::Dir(dir) => dir.flatten_into(&path, out),
            }
        }
    }
}

/// A named preopened root.
#[derive(Debug, Clone)]
pub struct Mount {
    path: String,
    tree: DirTree,
}

/// The virtual file tree the guest runs against.
#[derive(Debug, Clone)]
pub struct Vfs {
    mounts: Vec<Mount>,
}

/// The mount the submitted source is written into and artifacts are read
/// back from.
pub const APP_MOUNT: &str = "/app";

impl Vfs {
    /// Create the default mount set: `/` and `/app`, both empty.
    pub fn new() -> Self {
        Self {
            mounts: vec![
                Mount {
                    path: "/".to_string(),
                    tree: DirTree::new(),
                },
                Mount {
                    path: APP_MOUNT.to_string(),
                    tree: DirTree::new(),
                },
            ],
        }
    }

    /// Preopened mount paths, in preopen order.
    pub fn mount_paths(&self) -> impl Iterator<Item = &str> {
        self.mounts.iter().map(|m| m.path.as_str())
    }

    /// Mutable access to the tree rooted at `path`.
    pub fn mount_mut(&mut self, path: &str) -> Option<&mut DirTree> {
        self.mounts
            .iter_mut()
            .find(|m| m.path == path)
            .map(|m| &mut m.tree)
    }

    /// Read access to the tree rooted at `path`.
    pub fn mount(&self, path: &str) -> Option<&DirTree> {
        self.mounts.iter().find(|m| m.path == path).map(|m| &m.tree)
    }

    /// Write a file directly under the mount rooted at `path`.
    ///
    /// Returns false when no such mount exists.
    pub fn write_file(&mut self, mount: &str, name: &str, content: Vec<u8>) -> bool {
        match self.mount_mut(mount) {
            Some(tree) => {
                tree.insert_file(name, content);
                true
            }
            None => false,
        }
    }

    /// Walk every mount recursively and return each leaf as a slash-joined
    /// path relative to its mount root. When two mounts expose the same
    /// relative path, the later preopen wins.
    pub fn snapshot(&self) -> FileSnapshot {
        let mut out = FileSnapshot::new();
        for mount in &self.mounts {
            mount.tree.flatten_into("", &mut out);
        }
        out
    }

    /// Clear the contents of every mount, keeping the mount set itself.
    pub fn clear(&mut self) {
        for mount in &mut self.mounts {
            mount.tree.clear();
        }
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_flattens_nested_directories() {
        let mut vfs = Vfs::new();
        let mut sub = DirTree::new();
        sub.insert_file("score.png", vec![1, 2, 3]);
        let app = vfs.mount_mut(APP_MOUNT).unwrap();
        app.insert_file("main.ly", b"music".to_vec());
        app.insert_dir("out", sub);

        let snapshot = vfs.snapshot();
        let paths: Vec<_> = snapshot.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["main.ly", "out/score.png"]);
        assert_eq!(snapshot["out/score.png"], vec![1, 2, 3]);
    }

    #[test]
    fn clear_keeps_mounts_but_drops_contents() {
        let mut vfs = Vfs::new();
        assert!(vfs.write_file(APP_MOUNT, "a.txt", vec![0]));
        vfs.clear();
        assert!(vfs.mount(APP_MOUNT).unwrap().is_empty());
        assert_eq!(vfs.mount_paths().count(), 2);
    }

    #[test]
    fn unknown_mount_is_reported() {
        let mut vfs = Vfs::new();
        assert!(!vfs.write_file("/tmp", "a.txt", vec![0]));
    }
}
