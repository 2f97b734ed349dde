//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the build cache.
///
/// Store operations are fail-safe and only log these; they surface from
/// [`BuildCacheStore::flush`](crate::BuildCacheStore::flush) and the hashing
/// primitives.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache file could not be serialized or deserialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
