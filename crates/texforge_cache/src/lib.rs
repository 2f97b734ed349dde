//! Incremental build cache.
//!
//! This crate fingerprints the files of a LaTeX project and remembers, per
//! root document, the state of every dependency at the last successful build.
//! Comparing that record with the current files tells the planner what changed.

#![warn(missing_docs)]

pub mod error;
pub mod hasher;
pub mod record;
pub mod store;

pub use error::CacheError;
pub use hasher::ContentHasher;
pub use record::{BuildCacheRecord, CacheEntry, CacheFile, CACHE_FILE, FORMAT_VERSION};
pub use store::{BuildCacheStore, CacheStatistics, ChangeSet, RootStatistics};
