//! Lexical path normalization for document keys.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path lexically so it can be used as a document key.
///
/// Relative paths are made absolute against the current working directory,
/// `.` components are dropped and `..` pops the previous component. Symlinks
/// are not resolved; the filesystem is never consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        let base = std::env::current_dir().unwrap_or_default();
        normalize_lexically(&base.join(path))
    }
}

/// Removes `.` and `..` components without touching the filesystem.
///
/// A `..` directly below the root is dropped, matching how the OS treats `/..`.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Returns `true` if `path` is `boundary` or lies below it (lexically).
pub fn is_within(path: &Path, boundary: &Path) -> bool {
    path.starts_with(boundary)
}
