//! Shared foundational types used across the texforge workspace.
//!
//! This crate provides content fingerprints, lexical path normalization for
//! document keys, and the millisecond timestamps stored in the build cache.

#![warn(missing_docs)]

pub mod hash;
pub mod path;
pub mod time;

pub use hash::ContentHash;
pub use path::{is_within, normalize_lexically, normalize_path};
pub use time::{now_millis, system_time_millis};
