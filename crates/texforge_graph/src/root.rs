//! Discovery of the compilation root for an arbitrary project file.
//!
//! Resolution runs a fixed sequence of strategies and the first match wins:
//! explicit override, self-declaration, magic comment, sibling search,
//! ancestor search, and finally the document itself.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use texforge_common::{is_within, normalize_lexically, normalize_path};
use texforge_config::AncestorOrder;
use tracing::debug;

use crate::directive::{declares_document_class, magic_root};
use crate::fs::{FileSystem, RealFs};
use crate::resolve::has_extension;
use crate::scanner::DependencyScanner;

/// Which resolution step produced the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootSource {
    /// The configured root override.
    Explicit,
    /// A `% !TEX root` comment in the document.
    MagicComment,
    /// The document declares `\documentclass` itself.
    SelfDeclared,
    /// A root in the document's own directory includes it.
    Sibling,
    /// A root in an ancestor directory includes it.
    Ancestor,
    /// Nothing matched; the document is its own root.
    Fallback,
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Explicit => "explicit override",
            Self::MagicComment => "magic comment",
            Self::SelfDeclared => "self-declared",
            Self::Sibling => "sibling search",
            Self::Ancestor => "ancestor search",
            Self::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// The outcome of root resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RootResolution {
    /// The compilation root.
    pub root: PathBuf,
    /// How the root was found.
    pub source: RootSource,
}

/// Finds the compilation root of a document.
#[derive(Debug, Clone)]
pub struct RootResolver<F = RealFs> {
    scanner: DependencyScanner<F>,
    explicit_root: Option<PathBuf>,
    ancestor_order: AncestorOrder,
}

impl<F: FileSystem> RootResolver<F> {
    /// Creates a resolver that shares the scanner's inclusion logic.
    pub fn new(scanner: DependencyScanner<F>) -> Self {
        Self {
            scanner,
            explicit_root: None,
            ancestor_order: AncestorOrder::default(),
        }
    }

    /// Sets the configured root, relative to the workspace boundary.
    pub fn with_explicit_root(mut self, root: Option<PathBuf>) -> Self {
        self.explicit_root = root;
        self
    }

    /// Sets which ancestor directory wins when several hold a valid root.
    pub fn with_ancestor_order(mut self, order: AncestorOrder) -> Self {
        self.ancestor_order = order;
        self
    }

    /// The scanner used for inclusion tests.
    pub fn scanner(&self) -> &DependencyScanner<F> {
        &self.scanner
    }

    /// Resolves the root for `document`, never failing.
    pub fn resolve_root(&self, document: &Path, workspace: &Path) -> RootResolution {
        let document = normalize_path(document);
        let workspace = normalize_path(workspace);
        let resolution = self.resolve_inner(&document, &workspace);
        debug!(
            document = %document.display(),
            root = %resolution.root.display(),
            source = %resolution.source,
            "root resolved"
        );
        resolution
    }

    fn resolve_inner(&self, document: &Path, workspace: &Path) -> RootResolution {
        let fs = self.scanner.fs();

        if let Some(explicit) = &self.explicit_root {
            let root = normalize_lexically(&workspace.join(explicit));
            if fs.is_file(&root) {
                return RootResolution {
                    root,
                    source: RootSource::Explicit,
                };
            }
            debug!(root = %root.display(), "configured root does not exist");
        }

        let text = fs.read_text(document).unwrap_or_default();
        let dir = document.parent().map(Path::to_path_buf).unwrap_or_default();

        if declares_document_class(&text) {
            return RootResolution {
                root: document.to_path_buf(),
                source: RootSource::SelfDeclared,
            };
        }

        if self.scanner.options().magic_comments {
            if let Some(target) = magic_root(&text) {
                let root = normalize_lexically(&dir.join(target));
                if fs.is_file(&root) {
                    return RootResolution {
                        root,
                        source: RootSource::MagicComment,
                    };
                }
            }
        }

        if let Some(root) = self.find_root_in(&dir, document) {
            return RootResolution {
                root,
                source: RootSource::Sibling,
            };
        }

        for ancestor in self.ancestor_dirs(&dir, workspace) {
            if let Some(root) = self.find_root_in(&ancestor, document) {
                return RootResolution {
                    root,
                    source: RootSource::Ancestor,
                };
            }
        }

        RootResolution {
            root: document.to_path_buf(),
            source: RootSource::Fallback,
        }
    }

    /// Ancestors of `dir` up to and including `workspace`, in configured order.
    ///
    /// Empty when `dir` is not inside the workspace.
    fn ancestor_dirs(&self, dir: &Path, workspace: &Path) -> Vec<PathBuf> {
        if !is_within(dir, workspace) {
            return Vec::new();
        }
        let mut dirs: Vec<PathBuf> = dir
            .ancestors()
            .skip(1)
            .take_while(|a| is_within(a, workspace))
            .map(Path::to_path_buf)
            .collect();
        if self.ancestor_order == AncestorOrder::Furthest {
            dirs.reverse();
        }
        dirs
    }

    /// Finds a source file in `dir` that declares itself a root and
    /// transitively includes `document`.
    fn find_root_in(&self, dir: &Path, document: &Path) -> Option<PathBuf> {
        let fs = self.scanner.fs();
        let ext = &self.scanner.options().source_extension;
        fs.list_files(dir)
            .into_iter()
            .filter(|candidate| candidate != document && has_extension(candidate, ext))
            .find(|candidate| {
                fs.read_text(candidate)
                    .is_some_and(|text| declares_document_class(&text))
                    && self.scanner.includes(candidate, document)
            })
    }
}
