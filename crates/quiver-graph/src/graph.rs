use std::fmt::Debug;
use std::hash::Hash;

/// A directed edge connecting an ordered pair of nodes.
///
/// Within a single graph, no two edges share the same (source, target)
/// pair.
pub trait Edge {
    type Node;

    fn source(&self) -> Self::Node;

    fn target(&self) -> Self::Node;
}

/// Adjacency capability over a set of program nodes.
///
/// Nodes are opaque identities owned by the graph. A graph handed to an
/// analysis must not change for the duration of the computation; every
/// operation here is read-only.
pub trait Graph {
    type Node: Clone + Eq + Hash + Debug;
    type Edge: Edge<Node = Self::Node>;

    /// All nodes of this graph, in no particular order.
    fn nodes(&self) -> impl Iterator<Item = &Self::Node> + '_;

    fn contains_node(&self, node: &Self::Node) -> bool;

    /// Nodes with an edge into `node`.
    fn predecessors(&self, node: &Self::Node) -> impl Iterator<Item = &Self::Node> + '_;

    /// Nodes with an edge out of `node`.
    fn successors(&self, node: &Self::Node) -> impl Iterator<Item = &Self::Node> + '_;

    /// The unique edge from `source` to `target`, if one exists.
    fn edge_connecting(&self, source: &Self::Node, target: &Self::Node) -> Option<&Self::Edge>;
}
