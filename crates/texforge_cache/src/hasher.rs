//! Content fingerprinting of files on disk.

use std::path::Path;

use texforge_common::{system_time_millis, ContentHash};

use crate::error::CacheError;
use crate::record::CacheEntry;

/// Computes content fingerprints for change detection.
pub struct ContentHasher;

impl ContentHasher {
    /// Reads a file and returns its XXH3-128 content hash.
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ContentHash::from_bytes(&content))
    }

    /// Returns the hash of `path`, or `None` if it cannot be read.
    ///
    /// Files disappear and reappear constantly while a project is being
    /// edited, so an unreadable file is reported as missing rather than as
    /// an error.
    pub fn hash(path: &Path) -> Option<ContentHash> {
        Self::hash_file(path).ok()
    }

    /// Captures the current hash and modification time of `path`.
    ///
    /// The modification time falls back to zero when the platform does not
    /// report one.
    pub fn snapshot(path: &Path) -> Option<CacheEntry> {
        let content_hash = Self::hash(path)?;
        let modified_ms = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(system_time_millis)
            .unwrap_or(0);
        Some(CacheEntry {
            content_hash,
            modified_ms,
        })
    }
}
