use quiver_graph::{Edge, Graph};

use crate::error::SemanticError;
use crate::lattice::{Lattice, StateStore};

/// An edge that lifts an abstract state from its source post-state to the
/// contribution it makes to its target's entry state.
///
/// `traverse` must be pure: same state in, same state out, no effect on
/// the graph.
pub trait SemanticEdge<S>: Edge {
    fn traverse(&self, state: &S) -> Result<S, SemanticError>;
}

/// A graph over which a fixpoint can be computed.
///
/// Adds to the plain adjacency capability the factory hook producing the
/// store where results on inner nodes are kept during the analysis of one
/// outer node. Concrete graph types decide the store representation; most
/// use a [`FunctionalLattice`](crate::FunctionalLattice) keyed by their
/// node type.
pub trait FixpointGraph<S: Lattice>: Graph
where
    Self::Edge: SemanticEdge<S>,
{
    type Store: StateStore<Self::Node, S>;

    /// Build a fresh store for the analysis of one node, given the entry
    /// state the analysis starts from.
    fn make_internal_store(&self, entry_state: &S) -> Self::Store;
}

/// Transfer function computing the abstract post-state of a node.
///
/// Given a node and its entry state, implementations return the state
/// holding after the node executes. States computed for inner nodes along
/// the way are recorded in `store`. `call_graph` may be queried for
/// semantic information on other graphs; the engine passes it through
/// unmediated.
///
/// Implementations may keep external caches but must be deterministic:
/// identical `(node, entry_state)` must yield an identical post-state and
/// store population.
pub trait SemanticFunction<N, S, CG, F> {
    fn compute(
        &mut self,
        node: &N,
        entry_state: &S,
        call_graph: &CG,
        store: &mut F,
    ) -> Result<S, SemanticError>;
}

impl<N, S, CG, F, T> SemanticFunction<N, S, CG, F> for T
where
    T: FnMut(&N, &S, &CG, &mut F) -> Result<S, SemanticError>,
{
    fn compute(
        &mut self,
        node: &N,
        entry_state: &S,
        call_graph: &CG,
        store: &mut F,
    ) -> Result<S, SemanticError> {
        self(node, entry_state, call_graph, store)
    }
}
