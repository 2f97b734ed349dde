//! Transitive dependency discovery starting from a root document.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use texforge_common::{normalize_lexically, normalize_path};
use tracing::{debug, trace};

use crate::directive::{list_directives, DirectiveFamily};
use crate::fs::{FileSystem, RealFs};
use crate::graph::{EdgeKind, NodeId, NodeKind, ProjectGraph};
use crate::resolve::{resolve_bibliographies, resolve_image, resolve_subdocument, ScanOptions};

/// Which directive families a scan follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanMode {
    /// Subdocuments, bibliographies and images.
    Full,
    /// Subdocument edges only, as used for root detection.
    SubdocumentsOnly,
}

/// A queued document together with the image search directories in effect
/// where it was included.
struct Pending {
    node: NodeId,
    path: PathBuf,
    graphics_paths: Vec<PathBuf>,
}

/// Builds [`ProjectGraph`]s by following inclusion directives.
///
/// The scanner holds no state between calls: every call starts from a fresh
/// visited set, so repeated calls over an unchanged tree return identical graphs.
#[derive(Debug, Clone)]
pub struct DependencyScanner<F = RealFs> {
    fs: F,
    options: ScanOptions,
}

impl DependencyScanner<RealFs> {
    /// Creates a scanner over the real filesystem.
    pub fn new(options: ScanOptions) -> Self {
        Self { fs: RealFs, options }
    }
}

impl<F: FileSystem> DependencyScanner<F> {
    /// Creates a scanner over the given filesystem.
    pub fn with_fs(fs: F, options: ScanOptions) -> Self {
        Self { fs, options }
    }

    /// The filesystem this scanner reads from.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// The resolution options in effect.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Computes every file reachable from `root`.
    ///
    /// Subdocuments are recursed into; bibliographies and images are leaves.
    /// Unresolvable targets are skipped and cycles stop at the visited check.
    pub fn resolve_dependencies(&self, root: &Path) -> ProjectGraph {
        self.scan(root, ScanMode::Full)
    }

    /// Computes the documents reachable from `root` through subdocument edges only.
    pub fn subdocument_graph(&self, root: &Path) -> ProjectGraph {
        self.scan(root, ScanMode::SubdocumentsOnly)
    }

    /// Returns `true` if `candidate` transitively includes `document`.
    ///
    /// A document does not include itself, even through a cycle.
    pub fn includes(&self, candidate: &Path, document: &Path) -> bool {
        let candidate = normalize_path(candidate);
        let document = normalize_path(document);
        if candidate == document {
            return false;
        }
        self.subdocument_graph(&candidate).contains(&document)
    }

    fn scan(&self, root: &Path, mode: ScanMode) -> ProjectGraph {
        let root = normalize_path(root);
        let mut graph = ProjectGraph::new(root.clone());
        let mut queue = VecDeque::from([Pending {
            node: graph.root(),
            path: root,
            graphics_paths: Vec::new(),
        }]);

        while let Some(pending) = queue.pop_front() {
            let Some(text) = self.fs.read_text(&pending.path) else {
                debug!(path = %pending.path.display(), "unreadable document skipped");
                continue;
            };
            let dir = pending
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let mut graphics_paths = pending.graphics_paths;

            for directive in list_directives(&text) {
                match directive.kind.family() {
                    DirectiveFamily::Subdocument(inclusion) => {
                        let Some(target) = resolve_subdocument(
                            &self.fs,
                            &dir,
                            directive.base_dir.as_deref(),
                            &directive.argument,
                            &self.options,
                        ) else {
                            trace!(argument = %directive.argument, "unresolved subdocument");
                            continue;
                        };
                        let (id, added) = graph.intern(target.clone(), NodeKind::Subdocument);
                        graph.add_edge(pending.node, id, EdgeKind::Subdocument(inclusion));
                        if added {
                            queue.push_back(Pending {
                                node: id,
                                path: target,
                                graphics_paths: graphics_paths.clone(),
                            });
                        }
                    }
                    DirectiveFamily::Bibliography if mode == ScanMode::Full => {
                        for target in resolve_bibliographies(
                            &self.fs,
                            &dir,
                            &directive.argument,
                            &self.options,
                        ) {
                            let (id, _) = graph.intern(target, NodeKind::Bibliography);
                            graph.add_edge(pending.node, id, EdgeKind::Bibliography);
                        }
                    }
                    DirectiveFamily::Image if mode == ScanMode::Full => {
                        let mut search_dirs = Vec::with_capacity(graphics_paths.len() + 1);
                        search_dirs.push(dir.clone());
                        search_dirs.extend(graphics_paths.iter().cloned());
                        match resolve_image(&self.fs, &search_dirs, &directive.argument, &self.options) {
                            Some(target) => {
                                let (id, _) = graph.intern(target, NodeKind::Image);
                                graph.add_edge(pending.node, id, EdgeKind::Image);
                            }
                            None => trace!(argument = %directive.argument, "unresolved image"),
                        }
                    }
                    DirectiveFamily::GraphicsPath => {
                        let gp = normalize_lexically(&dir.join(&directive.argument));
                        if !graphics_paths.contains(&gp) {
                            graphics_paths.push(gp);
                        }
                    }
                    DirectiveFamily::Bibliography
                    | DirectiveFamily::Image
                    | DirectiveFamily::DocumentClass => {}
                }
            }
        }

        debug!(
            root = %graph.root_path().display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph resolved"
        );
        graph
    }
}
