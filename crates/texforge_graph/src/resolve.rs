//! Resolution of directive arguments to concrete file paths.
//!
//! All targets resolve relative to the directory of the *including* file, not
//! the root's directory. A resolved path is returned only if it names an
//! existing file; anything else is silently unresolved.

use std::path::{Path, PathBuf};

use texforge_common::normalize_lexically;
use texforge_config::ScanConfig;

use crate::fs::FileSystem;

/// Extensions and switches that drive directive resolution.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Appended to extensionless subdocument targets.
    pub source_extension: String,
    /// Appended to bibliography names that lack it.
    pub bibliography_extension: String,
    /// Tried in order when an image reference does not exist literally.
    pub image_extensions: Vec<String>,
    /// Whether `% !TEX root` comments are honored by the root resolver.
    pub magic_comments: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from(&ScanConfig::default())
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            source_extension: config.source_extension.clone(),
            bibliography_extension: config.bibliography_extension.clone(),
            image_extensions: config.image_extensions.clone(),
            magic_comments: config.magic_comments,
        }
    }
}

/// Returns `true` if `path`'s extension equals `ext` (without the dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// Appends `.ext` to the file name, keeping any existing dots.
fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Resolves a subdocument target.
///
/// The literal target is tried first; if it has no extension and does not
/// exist, the source extension is appended and tried again. `base_dir` is the
/// directory argument of two-argument import forms.
pub fn resolve_subdocument(
    fs: &impl FileSystem,
    including_dir: &Path,
    base_dir: Option<&str>,
    target: &str,
    options: &ScanOptions,
) -> Option<PathBuf> {
    if target.is_empty() {
        return None;
    }
    let dir = match base_dir {
        Some(base) => including_dir.join(base),
        None => including_dir.to_path_buf(),
    };
    let literal = normalize_lexically(&dir.join(target));
    if fs.is_file(&literal) {
        return Some(literal);
    }
    if literal.extension().is_none() {
        let with_ext = with_appended_extension(&literal, &options.source_extension);
        if fs.is_file(&with_ext) {
            return Some(with_ext);
        }
    }
    None
}

/// Resolves every name of a comma-separated bibliography argument.
///
/// Each name gets the bibliography extension appended if absent. Names that do
/// not resolve to an existing file are dropped.
pub fn resolve_bibliographies(
    fs: &impl FileSystem,
    including_dir: &Path,
    argument: &str,
    options: &ScanOptions,
) -> Vec<PathBuf> {
    argument
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            let mut path = normalize_lexically(&including_dir.join(name));
            if !has_extension(&path, &options.bibliography_extension) {
                path = with_appended_extension(&path, &options.bibliography_extension);
            }
            fs.is_file(&path).then_some(path)
        })
        .collect()
}

/// Resolves an image reference.
///
/// Each search directory is tried in order (the including file's directory
/// first, then any graphics paths); within a directory the literal name wins,
/// then each configured extension in order.
pub fn resolve_image(
    fs: &impl FileSystem,
    search_dirs: &[PathBuf],
    target: &str,
    options: &ScanOptions,
) -> Option<PathBuf> {
    if target.is_empty() {
        return None;
    }
    for dir in search_dirs {
        let literal = normalize_lexically(&dir.join(target));
        if fs.is_file(&literal) {
            return Some(literal);
        }
        for ext in &options.image_extensions {
            let candidate = with_appended_extension(&literal, ext);
            if fs.is_file(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}
