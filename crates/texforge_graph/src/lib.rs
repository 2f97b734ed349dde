//! Dependency discovery for multi-file LaTeX projects.
//!
//! This crate parses inclusion directives out of `.tex` sources, follows them
//! transitively into a [`ProjectGraph`], and determines which file of a project
//! is the compilation root for any given document.

#![warn(missing_docs)]

pub mod directive;
pub mod fs;
pub mod graph;
pub mod resolve;
pub mod root;
pub mod scanner;

pub use directive::{declares_document_class, list_directives, magic_root, Directive, DirectiveKind};
pub use fs::{FileSystem, MemoryFs, RealFs};
pub use graph::{DependencyEdge, EdgeKind, GraphNode, InclusionMode, NodeId, NodeKind, ProjectGraph};
pub use resolve::ScanOptions;
pub use root::{RootResolution, RootResolver, RootSource};
pub use scanner::DependencyScanner;
