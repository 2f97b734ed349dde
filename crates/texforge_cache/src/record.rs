//! Persisted build records.
//!
//! All records live in a single `build-cache.json` in the cache directory,
//! read in full when the store is loaded and rewritten in full after every
//! change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use texforge_common::ContentHash;

use crate::error::CacheError;

/// Name of the cache file within the cache directory.
pub const CACHE_FILE: &str = "build-cache.json";

/// Version of the on-disk layout. Files written with another version are
/// ignored.
pub const FORMAT_VERSION: u32 = 1;

/// Snapshot of one file at the time of a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content fingerprint. The only signal used for change detection.
    pub content_hash: ContentHash,

    /// Last observed modification time in milliseconds since the epoch.
    /// Kept for diagnostics only.
    pub modified_ms: u64,
}

/// Everything remembered about the last successful build of one root.
///
/// Replaced wholesale by every successful build; never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCacheRecord {
    /// The root document.
    pub root: PathBuf,

    /// One entry per file that existed at build time, the root included.
    pub entries: BTreeMap<PathBuf, CacheEntry>,

    /// Every non-root node of the dependency graph at build time.
    pub dependencies: Vec<PathBuf>,

    /// Completion time of the build in milliseconds since the epoch.
    pub last_build_ms: u64,
}

/// The full contents of `build-cache.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheFile {
    /// Layout version that produced this file.
    pub format_version: u32,

    /// Records keyed by root path.
    pub records: BTreeMap<PathBuf, BuildCacheRecord>,
}

impl Default for CacheFile {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheFile {
    /// Creates an empty cache file at the current format version.
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            records: BTreeMap::new(),
        }
    }

    /// Loads the cache file from `cache_dir`, returning `None` if it does
    /// not exist or cannot be parsed.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(CACHE_FILE);
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Writes the cache file to `cache_dir`, creating the directory if needed.
    ///
    /// The JSON goes to a temporary sibling first and is renamed into place,
    /// so readers never observe a half-written file.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        let path = cache_dir.join(CACHE_FILE);
        let tmp = cache_dir.join(format!("{CACHE_FILE}.tmp"));
        std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns `true` if this file was written with the current layout.
    pub fn is_compatible(&self) -> bool {
        self.format_version == FORMAT_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(root: &str) -> BuildCacheRecord {
        let root = PathBuf::from(root);
        let mut entries = BTreeMap::new();
        entries.insert(
            root.clone(),
            CacheEntry {
                content_hash: ContentHash::from_bytes(b"\\documentclass{article}"),
                modified_ms: 1_700_000_000_000,
            },
        );
        BuildCacheRecord {
            root,
            entries,
            dependencies: vec![PathBuf::from("/doc/intro.tex")],
            last_build_ms: 1_700_000_000_500,
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = CacheFile::new();
        file.records
            .insert(PathBuf::from("/doc/main.tex"), sample_record("/doc/main.tex"));
        file.save(dir.path()).unwrap();

        let loaded = CacheFile::load(dir.path()).unwrap();
        assert_eq!(loaded, file);
        assert!(!dir.path().join(format!("{CACHE_FILE}.tmp")).exists());
    }

    #[test]
    fn save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join(".texforge");
        CacheFile::new().save(&nested).unwrap();
        assert!(nested.join(CACHE_FILE).exists());
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CacheFile::load(dir.path()).is_none());
    }

    #[test]
    fn load_corrupt_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE), "{ not json").unwrap();
        assert!(CacheFile::load(dir.path()).is_none());
    }

    #[test]
    fn compatibility() {
        let mut file = CacheFile::new();
        assert!(file.is_compatible());
        file.format_version = FORMAT_VERSION + 1;
        assert!(!file.is_compatible());
    }

    #[test]
    fn json_layout() {
        let mut file = CacheFile::new();
        file.records
            .insert(PathBuf::from("/doc/main.tex"), sample_record("/doc/main.tex"));
        let value: serde_json::Value = serde_json::to_value(&file).unwrap();
        let record = &value["records"]["/doc/main.tex"];
        assert_eq!(value["format_version"], FORMAT_VERSION);
        assert_eq!(record["last_build_ms"], 1_700_000_000_500u64);
        let hash = record["entries"]["/doc/main.tex"]["content_hash"].as_str().unwrap();
        assert_eq!(hash.len(), 32);
    }
}
