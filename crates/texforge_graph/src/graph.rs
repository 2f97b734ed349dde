//! Arena-backed dependency graph of a root document.
//!
//! Nodes live in a `Vec` indexed by [`NodeId`]; a side table maps each
//! normalized path to its node, which is what makes the node set idempotent
//! under diamond dependencies and cycles.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque, copyable index of a node in a [`ProjectGraph`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// How a subdocument directive splices its child into the parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionMode {
    /// Child text is merged into the parent's output stream (`\input`).
    Mergeable,
    /// Child is an independently paginated unit (`\include`).
    Sectioned,
}

/// The kind of a dependency edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "mode", rename_all = "lowercase")]
pub enum EdgeKind {
    /// A source document included by another.
    Subdocument(InclusionMode),
    /// A bibliography database.
    Bibliography,
    /// An image file.
    Image,
}

/// The role of a node, fixed by the first edge that discovered it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The compilation root.
    Root,
    /// A source document below the root.
    Subdocument,
    /// A bibliography database.
    Bibliography,
    /// An image file.
    Image,
}

/// A file in the project graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// The unique ID of this node.
    pub id: NodeId,
    /// Normalized absolute path of the file.
    pub path: PathBuf,
    /// The role of this file.
    pub kind: NodeKind,
}

/// A directed dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// The including document.
    pub from: NodeId,
    /// The included or referenced file.
    pub to: NodeId,
    /// How `to` is referenced.
    pub kind: EdgeKind,
}

/// Every file reachable from a root, plus the edges that reach them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<DependencyEdge>,
    #[serde(skip)]
    index: HashMap<PathBuf, NodeId>,
    #[serde(skip)]
    edge_set: HashSet<DependencyEdge>,
}

impl ProjectGraph {
    /// Creates a graph holding only the root node.
    pub fn new(root: PathBuf) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
            edge_set: HashSet::new(),
        };
        graph.intern(root, NodeKind::Root);
        graph
    }

    /// Returns the node for `path`, adding it if absent.
    ///
    /// The boolean is `true` when the node was newly added. An existing node
    /// keeps the kind it was first added with.
    pub fn intern(&mut self, path: PathBuf, kind: NodeKind) -> (NodeId, bool) {
        if let Some(&id) = self.index.get(&path) {
            return (id, false);
        }
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.index.insert(path.clone(), id);
        self.nodes.push(GraphNode { id, path, kind });
        (id, true)
    }

    /// Records an edge, ignoring exact duplicates. Returns `true` if added.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> bool {
        let edge = DependencyEdge { from, to, kind };
        if !self.edge_set.insert(edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// The root node's ID.
    pub fn root(&self) -> NodeId {
        NodeId::from_raw(0)
    }

    /// The root document's path.
    pub fn root_path(&self) -> &Path {
        &self.nodes[0].path
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.as_raw() as usize]
    }

    /// Looks up the node for a path.
    pub fn id_of(&self, path: &Path) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    /// Returns `true` if `path` is a node of this graph.
    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// All nodes, root first, in discovery order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// All edges in discovery order.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Paths of every node, root included.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.nodes.iter().map(|n| n.path.as_path())
    }

    /// Paths of every node except the root, in discovery order.
    pub fn dependencies(&self) -> Vec<PathBuf> {
        self.nodes[1..].iter().map(|n| n.path.clone()).collect()
    }

    /// Total number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns all edges arriving at the given node.
    pub fn incoming_edges(&self, node: NodeId) -> Vec<&DependencyEdge> {
        self.edges.iter().filter(|e| e.to == node).collect()
    }

    /// Returns all edges originating from the given node.
    pub fn outgoing_edges(&self, node: NodeId) -> Vec<&DependencyEdge> {
        self.edges.iter().filter(|e| e.from == node).collect()
    }

    /// Returns `true` if `node` is reached from the root only through
    /// sectioned subdocument edges.
    ///
    /// Every incoming edge must be sectioned, and every including document must
    /// itself be the root or satisfy the same condition. The root is never
    /// sectioned-only. Cycles count against the node.
    pub fn is_sectioned_only(&self, node: NodeId) -> bool {
        let mut in_progress = HashSet::new();
        self.sectioned_only_inner(node, &mut in_progress)
    }

    fn sectioned_only_inner(&self, node: NodeId, in_progress: &mut HashSet<NodeId>) -> bool {
        if node == self.root() || !in_progress.insert(node) {
            return false;
        }
        let incoming = self.incoming_edges(node);
        let ok = !incoming.is_empty()
            && incoming.iter().all(|edge| {
                edge.kind == EdgeKind::Subdocument(InclusionMode::Sectioned)
                    && (edge.from == self.root() || self.sectioned_only_inner(edge.from, in_progress))
            });
        in_progress.remove(&node);
        ok
    }

    /// Rebuilds the path index after deserialization.
    pub fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .map(|n| (n.path.clone(), n.id))
            .collect();
        self.edge_set = self.edges.iter().copied().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTIONED: EdgeKind = EdgeKind::Subdocument(InclusionMode::Sectioned);
    const MERGEABLE: EdgeKind = EdgeKind::Subdocument(InclusionMode::Mergeable);

    fn graph_with(paths: &[&str]) -> (ProjectGraph, Vec<NodeId>) {
        let mut g = ProjectGraph::new(PathBuf::from("/doc/main.tex"));
        let mut ids = vec![g.root()];
        for p in paths {
            ids.push(g.intern(PathBuf::from(p), NodeKind::Subdocument).0);
        }
        (g, ids)
    }

    #[test]
    fn node_id_roundtrip() {
        let id = NodeId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn new_graph_has_root_only() {
        let g = ProjectGraph::new(PathBuf::from("/doc/main.tex"));
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node(g.root()).kind, NodeKind::Root);
        assert_eq!(g.root_path(), Path::new("/doc/main.tex"));
        assert!(g.dependencies().is_empty());
    }

    #[test]
    fn intern_is_idempotent() {
        let mut g = ProjectGraph::new(PathBuf::from("/doc/main.tex"));
        let (a, new_a) = g.intern(PathBuf::from("/doc/a.tex"), NodeKind::Subdocument);
        let (b, new_b) = g.intern(PathBuf::from("/doc/a.tex"), NodeKind::Image);
        assert!(new_a);
        assert!(!new_b);
        assert_eq!(a, b);
        assert_eq!(g.node(a).kind, NodeKind::Subdocument);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn duplicate_edges_ignored() {
        let (mut g, ids) = graph_with(&["/doc/a.tex"]);
        assert!(g.add_edge(ids[0], ids[1], MERGEABLE));
        assert!(!g.add_edge(ids[0], ids[1], MERGEABLE));
        assert!(g.add_edge(ids[0], ids[1], SECTIONED));
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.outgoing_edges(ids[0]).len(), 2);
        assert_eq!(g.incoming_edges(ids[1]).len(), 2);
    }

    #[test]
    fn sectioned_child_of_root() {
        let (mut g, ids) = graph_with(&["/doc/a.tex"]);
        g.add_edge(ids[0], ids[1], SECTIONED);
        assert!(g.is_sectioned_only(ids[1]));
        assert!(!g.is_sectioned_only(g.root()));
    }

    #[test]
    fn mergeable_child_is_not_sectioned() {
        let (mut g, ids) = graph_with(&["/doc/a.tex"]);
        g.add_edge(ids[0], ids[1], MERGEABLE);
        assert!(!g.is_sectioned_only(ids[1]));
    }

    #[test]
    fn mixed_incoming_edges_disqualify() {
        let (mut g, ids) = graph_with(&["/doc/a.tex", "/doc/b.tex"]);
        g.add_edge(ids[0], ids[1], SECTIONED);
        g.add_edge(ids[0], ids[2], SECTIONED);
        g.add_edge(ids[1], ids[2], MERGEABLE);
        assert!(!g.is_sectioned_only(ids[2]));
    }

    #[test]
    fn sectioned_below_mergeable_disqualified() {
        let (mut g, ids) = graph_with(&["/doc/a.tex", "/doc/b.tex"]);
        g.add_edge(ids[0], ids[1], MERGEABLE);
        g.add_edge(ids[1], ids[2], SECTIONED);
        assert!(!g.is_sectioned_only(ids[2]));
    }

    #[test]
    fn sectioned_chain_qualifies() {
        let (mut g, ids) = graph_with(&["/doc/a.tex", "/doc/b.tex"]);
        g.add_edge(ids[0], ids[1], SECTIONED);
        g.add_edge(ids[1], ids[2], SECTIONED);
        assert!(g.is_sectioned_only(ids[2]));
    }

    #[test]
    fn sectioned_cycle_terminates() {
        let (mut g, ids) = graph_with(&["/doc/a.tex", "/doc/b.tex"]);
        g.add_edge(ids[1], ids[2], SECTIONED);
        g.add_edge(ids[2], ids[1], SECTIONED);
        assert!(!g.is_sectioned_only(ids[1]));
        assert!(!g.is_sectioned_only(ids[2]));
    }

    #[test]
    fn serde_roundtrip_with_reindex() {
        let (mut g, ids) = graph_with(&["/doc/a.tex"]);
        g.add_edge(ids[0], ids[1], SECTIONED);
        let json = serde_json::to_string(&g).unwrap();
        let mut back: ProjectGraph = serde_json::from_str(&json).unwrap();
        back.reindex();
        assert_eq!(back.id_of(Path::new("/doc/a.tex")), Some(ids[1]));
        assert!(back.is_sectioned_only(ids[1]));
        assert!(!back.add_edge(ids[0], ids[1], SECTIONED));
    }
}
