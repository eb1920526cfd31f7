use quiver_fixpoint::{FixpointGraph, FunctionalLattice, Lattice, SemanticEdge, SemanticError};
use quiver_graph::{AdjacencyMatrix, Edge, Graph};

use crate::chain::Chain;
use crate::interval::Interval;
use crate::spy::Spy;

/// Arithmetic transform applied while traversing a [`TestEdge`].
#[derive(Debug, Clone, Copy, Default)]
pub enum EdgeTransform {
    #[default]
    Identity,
    Add(i64),
    Scale(i64),
}

/// Edge of a [`TestGraph`], carrying an [`EdgeTransform`].
#[derive(Debug, Clone)]
pub struct TestEdge {
    source: u32,
    target: u32,
    transform: EdgeTransform,
}

impl TestEdge {
    pub fn new(source: u32, target: u32) -> Self {
        Self::with_transform(source, target, EdgeTransform::Identity)
    }

    pub fn with_transform(source: u32, target: u32, transform: EdgeTransform) -> Self {
        Self {
            source,
            target,
            transform,
        }
    }
}

impl Edge for TestEdge {
    type Node = u32;

    fn source(&self) -> u32 {
        self.source
    }

    fn target(&self) -> u32 {
        self.target
    }
}

impl SemanticEdge<Interval> for TestEdge {
    fn traverse(&self, state: &Interval) -> Result<Interval, SemanticError> {
        Ok(match self.transform {
            EdgeTransform::Identity => *state,
            EdgeTransform::Add(amount) => *state + Interval::constant(amount),
            EdgeTransform::Scale(factor) => *state * Interval::constant(factor),
        })
    }
}

impl SemanticEdge<Chain> for TestEdge {
    fn traverse(&self, state: &Chain) -> Result<Chain, SemanticError> {
        let level = i64::from(state.level());
        let moved = match self.transform {
            EdgeTransform::Identity => level,
            EdgeTransform::Add(amount) => level + amount,
            EdgeTransform::Scale(factor) => level * factor,
        };
        Ok(Chain::new(moved.clamp(0, i64::from(Chain::CAP)) as u8))
    }
}

impl<L> SemanticEdge<Spy<L>> for TestEdge
where
    L: Lattice,
    TestEdge: SemanticEdge<L>,
{
    fn traverse(&self, state: &Spy<L>) -> Result<Spy<L>, SemanticError> {
        state.try_map(|value| <Self as SemanticEdge<L>>::traverse(self, value))
    }
}

/// Small concrete [`FixpointGraph`] over `u32` nodes, for exercising the
/// engine against hand-built shapes.
#[derive(Debug, Default)]
pub struct TestGraph {
    matrix: AdjacencyMatrix<u32, TestEdge>,
}

impl TestGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph containing nodes `0 .. count` and no edges.
    pub fn with_nodes(count: u32) -> Self {
        let mut graph = Self::new();
        for node in 0..count {
            graph.matrix.add_node(node);
        }
        graph
    }

    pub fn add_node(&mut self, node: u32) {
        self.matrix.add_node(node);
    }

    pub fn add_edge(&mut self, source: u32, target: u32) {
        self.matrix.add_edge(TestEdge::new(source, target));
    }

    pub fn add_edge_with(&mut self, source: u32, target: u32, transform: EdgeTransform) {
        self.matrix
            .add_edge(TestEdge::with_transform(source, target, transform));
    }
}

impl Graph for TestGraph {
    type Node = u32;
    type Edge = TestEdge;

    fn nodes(&self) -> impl Iterator<Item = &u32> + '_ {
        self.matrix.nodes()
    }

    fn contains_node(&self, node: &u32) -> bool {
        self.matrix.contains_node(node)
    }

    fn predecessors(&self, node: &u32) -> impl Iterator<Item = &u32> + '_ {
        self.matrix.predecessors(node)
    }

    fn successors(&self, node: &u32) -> impl Iterator<Item = &u32> + '_ {
        self.matrix.successors(node)
    }

    fn edge_connecting(&self, source: &u32, target: &u32) -> Option<&TestEdge> {
        self.matrix.edge_connecting(source, target)
    }
}

impl<S: Lattice> FixpointGraph<S> for TestGraph
where
    TestEdge: SemanticEdge<S>,
{
    type Store = FunctionalLattice<u32, S>;

    fn make_internal_store(&self, _entry_state: &S) -> Self::Store {
        FunctionalLattice::new()
    }
}
