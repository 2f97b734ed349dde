//! Filesystem access used by the scanner and the root resolver.
//!
//! Graph traversal only needs three operations: read a document's text, test
//! whether a path names a file, and list the files of a directory. Routing
//! them through [`FileSystem`] lets traversal logic run against an in-memory
//! tree in tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use texforge_common::normalize_lexically;

/// Read-only filesystem operations needed for dependency discovery.
///
/// Every operation is infallible from the caller's view: a file that cannot be
/// read simply has no text, and a directory that cannot be listed is empty.
pub trait FileSystem {
    /// Returns the text of a file, or `None` if it cannot be read.
    fn read_text(&self, path: &Path) -> Option<String>;

    /// Returns `true` if `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Lists the regular files directly inside `dir`, sorted by path.
    fn list_files(&self, dir: &Path) -> Vec<PathBuf>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn read_text(&self, path: &Path) -> Option<String> {
        (**self).read_text(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        (**self).list_files(dir)
    }
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn read_text(&self, path: &Path) -> Option<String> {
        let bytes = std::fs::read(path).ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };
        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        files
    }
}

/// An in-memory file tree keyed by normalized absolute path.
///
/// Used by tests to exercise traversal without touching disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFs {
    /// Creates an empty in-memory tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files
            .insert(normalize_lexically(path.as_ref()), text.into());
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Removes a file, returning `true` if it existed.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> bool {
        self.files
            .remove(&normalize_lexically(path.as_ref()))
            .is_some()
    }
}

impl FileSystem for MemoryFs {
    fn read_text(&self, path: &Path) -> Option<String> {
        self.files.get(&normalize_lexically(path)).cloned()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_lexically(path))
    }

    fn list_files(&self, dir: &Path) -> Vec<PathBuf> {
        let dir = normalize_lexically(dir);
        self.files
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect()
    }
}
