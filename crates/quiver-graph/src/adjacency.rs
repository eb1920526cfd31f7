use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::graph::{Edge, Graph};

/// Per-node predecessor and successor lists, in edge insertion order.
#[derive(Debug, Clone)]
struct NodeEntry<N> {
    predecessors: Vec<N>,
    successors: Vec<N>,
}

impl<N> Default for NodeEntry<N> {
    fn default() -> Self {
        Self {
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }
}

/// Concrete adjacency structure backing a [`Graph`].
///
/// Stores the node set, ordered predecessor/successor lists per node, and
/// an edge table indexed by (source, target) so that
/// [`edge_connecting`](Graph::edge_connecting) is a single lookup.
#[derive(Debug, Clone)]
pub struct AdjacencyMatrix<N, E> {
    entries: FxHashMap<N, NodeEntry<N>>,
    edges: FxHashMap<(N, N), E>,
}

impl<N, E> Default for AdjacencyMatrix<N, E> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
            edges: FxHashMap::default(),
        }
    }
}

impl<N, E> AdjacencyMatrix<N, E>
where
    N: Clone + Eq + Hash + Debug,
    E: Edge<Node = N>,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` if the node was already present.
    pub fn add_node(&mut self, node: N) -> bool {
        match self.entries.entry(node) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(NodeEntry::default());
                true
            }
        }
    }

    /// Add an edge between two nodes already part of this matrix.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint has not been added, or if an edge with the
    /// same (source, target) pair is already present. Both are programming
    /// errors in graph construction.
    pub fn add_edge(&mut self, edge: E) {
        let source = edge.source();
        let target = edge.target();
        assert!(
            self.entries.contains_key(&source),
            "edge source {source:?} is not part of this graph"
        );
        assert!(
            self.entries.contains_key(&target),
            "edge target {target:?} is not part of this graph"
        );
        let previous = self.edges.insert((source.clone(), target.clone()), edge);
        assert!(
            previous.is_none(),
            "{source:?} and {target:?} are already connected"
        );
        self.entries
            .get_mut(&source)
            .expect("endpoint checked above")
            .successors
            .push(target.clone());
        self.entries
            .get_mut(&target)
            .expect("endpoint checked above")
            .predecessors
            .push(source);
    }

    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl<N, E> Graph for AdjacencyMatrix<N, E>
where
    N: Clone + Eq + Hash + Debug,
    E: Edge<Node = N>,
{
    type Node = N;
    type Edge = E;

    fn nodes(&self) -> impl Iterator<Item = &N> + '_ {
        self.entries.keys()
    }

    fn contains_node(&self, node: &N) -> bool {
        self.entries.contains_key(node)
    }

    fn predecessors(&self, node: &N) -> impl Iterator<Item = &N> + '_ {
        self.entries
            .get(node)
            .into_iter()
            .flat_map(|entry| entry.predecessors.iter())
    }

    fn successors(&self, node: &N) -> impl Iterator<Item = &N> + '_ {
        self.entries
            .get(node)
            .into_iter()
            .flat_map(|entry| entry.successors.iter())
    }

    fn edge_connecting(&self, source: &N, target: &N) -> Option<&E> {
        self.edges.get(&(source.clone(), target.clone()))
    }
}
