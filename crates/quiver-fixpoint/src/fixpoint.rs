use std::fmt::Debug;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::error;

use quiver_graph::{Graph, WorkingSet};

use crate::error::{FixpointError, SemanticError};
use crate::lattice::{Lattice, StateStore};
use crate::semantics::{FixpointGraph, SemanticEdge, SemanticFunction};

/// The default number of fixpoint iterations on a given node, per incoming
/// edge, after which [`Lattice::lub`] gets replaced with
/// [`Lattice::widening`].
pub const DEFAULT_WIDENING_THRESHOLD: u32 = 5;

/// Stored approximation for one outer node: its post-state together with
/// the store holding the states of its inner nodes. The two members are
/// always stored and replaced together.
struct NodeResult<S, F> {
    post: S,
    inner: F,
}

/// Worklist-based fixpoint driver over a [`FixpointGraph`].
///
/// Starting from a set of entry nodes with prescribed entry states, the
/// driver repeatedly pops a node from the working set, computes its entry
/// state by joining the edge-transformed post-states of its predecessors,
/// runs the transfer function, and combines the outcome with the stored
/// approximation: [`Lattice::lub`] while the node's iteration budget
/// lasts, [`Lattice::widening`] afterwards. Successors are re-enqueued
/// whenever the stored approximation grows. On exhaustion, outer results
/// and inner-node stores are flattened into a single map.
///
/// The driver is single-threaded and non-suspending; all state other than
/// the returned map lives only for the duration of [`run`](Self::run).
pub struct FixpointEngine<'g, G> {
    graph: &'g G,
    widen_after: u32,
}

impl<'g, G> FixpointEngine<'g, G> {
    /// Build an engine over `graph` with [`DEFAULT_WIDENING_THRESHOLD`].
    pub fn new(graph: &'g G) -> Self {
        Self {
            graph,
            widen_after: DEFAULT_WIDENING_THRESHOLD,
        }
    }

    /// Replace lub with widening after `widen_after` updates per incoming
    /// edge of a node. Zero means lub on every update, leaving termination
    /// entirely to the height of the domain.
    pub fn with_widening_threshold(mut self, widen_after: u32) -> Self {
        self.widen_after = widen_after;
        self
    }
}

impl<'g, G: Graph> FixpointEngine<'g, G> {
    /// Compute the fixpoint of `semantics` over the graph.
    ///
    /// The computation starts at the nodes in `starting_points`, using
    /// their mapped values as entry states. `call_graph` is handed to the
    /// transfer function for cross-graph queries; `working_set` decides the
    /// processing order.
    ///
    /// The returned map has an entry for every outer node processed plus
    /// every inner node recorded in an internal store. On error the whole
    /// computation is aborted and no partial result is returned.
    pub fn run<S, CG, W, T>(
        &self,
        starting_points: FxHashMap<G::Node, S>,
        call_graph: &CG,
        mut working_set: W,
        mut semantics: T,
    ) -> Result<FxHashMap<G::Node, S>, FixpointError<G::Node>>
    where
        G: FixpointGraph<S>,
        G::Edge: SemanticEdge<S>,
        S: Lattice,
        W: WorkingSet<G::Node>,
        T: SemanticFunction<G::Node, S, CG, G::Store>,
    {
        let mut results: FxHashMap<G::Node, NodeResult<S, G::Store>> = FxHashMap::default();
        let mut lub_budgets: FxHashMap<G::Node, i64> = FxHashMap::default();

        for node in starting_points.keys() {
            working_set.push(node.clone());
        }

        while !working_set.is_empty() {
            let Some(current) = working_set.pop() else {
                return Err(FixpointError::UnknownNode { node: None });
            };
            if !self.graph.contains_node(&current) {
                return Err(FixpointError::UnknownNode {
                    node: Some(current),
                });
            }

            let Some(entry_state) = self.entry_state(&current, &starting_points, &results)?
            else {
                return Err(FixpointError::MissingEntryState { node: current });
            };

            let mut new_inner = self.graph.make_internal_store(&entry_state);
            let new_post =
                match semantics.compute(&current, &entry_state, call_graph, &mut new_inner) {
                    Ok(post) => post,
                    Err(source) => {
                        error!(node = ?current, error = %source, "semantics computation failed");
                        return Err(FixpointError::Transfer {
                            node: current,
                            source,
                        });
                    }
                };

            let (new_post, new_inner, grown) = match results.get(&current) {
                None => (new_post, new_inner, true),
                Some(old) => {
                    let (post, inner) =
                        self.combine(&current, old, new_post, new_inner, &mut lub_budgets)?;
                    let grown = !post
                        .less_or_equal(&old.post)
                        .map_err(|source| unexpected(&current, source))?
                        || !inner
                            .less_or_equal(&old.inner)
                            .map_err(|source| unexpected(&current, source))?;
                    (post, inner, grown)
                }
            };

            if grown {
                for successor in self.graph.successors(&current) {
                    working_set.push(successor.clone());
                }
                results.insert(
                    current,
                    NodeResult {
                        post: new_post,
                        inner: new_inner,
                    },
                );
            }
        }

        let mut flattened = FxHashMap::default();
        for (node, result) in results {
            flattened.insert(node, result.post);
            for (inner_node, state) in result.inner.entries() {
                flattened.insert(inner_node.clone(), state.clone());
            }
        }
        Ok(flattened)
    }

    /// Entry state of `current`: its starting-point seed, if any, joined
    /// with the edge-transformed post-state of every predecessor that has
    /// a stored result. `None` when neither exists.
    fn entry_state<S>(
        &self,
        current: &G::Node,
        starting_points: &FxHashMap<G::Node, S>,
        results: &FxHashMap<G::Node, NodeResult<S, G::Store>>,
    ) -> Result<Option<S>, FixpointError<G::Node>>
    where
        G: FixpointGraph<S>,
        G::Edge: SemanticEdge<S>,
        S: Lattice,
    {
        let mut contributions: SmallVec<[S; 4]> = SmallVec::new();
        for pred in self.graph.predecessors(current) {
            // this might not have been computed yet
            let Some(stored) = results.get(pred) else {
                continue;
            };
            let Some(edge) = self.graph.edge_connecting(pred, current) else {
                return Err(FixpointError::EntryState {
                    node: current.clone(),
                    source: SemanticError::new(format!(
                        "no edge connecting predecessor {pred:?} to {current:?}"
                    )),
                });
            };
            let contribution = edge.traverse(&stored.post).map_err(|source| {
                FixpointError::EntryState {
                    node: current.clone(),
                    source,
                }
            })?;
            contributions.push(contribution);
        }

        let mut entry_state = starting_points.get(current).cloned();
        for state in contributions {
            entry_state = Some(match entry_state {
                None => state,
                Some(so_far) => {
                    so_far
                        .lub(&state)
                        .map_err(|source| FixpointError::EntryState {
                            node: current.clone(),
                            source,
                        })?
                }
            });
        }
        Ok(entry_state)
    }

    /// Combine a freshly computed approximation with the stored one, by lub
    /// while the node's iteration budget lasts and by widening afterwards.
    ///
    /// The budget is initialized on the first revisit to `widen_after`
    /// times the node's predecessor count: branch-heavy join points
    /// accumulate updates faster, and the scaling keeps the number of lubs
    /// per incoming edge uniform. A node with no predecessors therefore
    /// widens on its first revisit.
    fn combine<S>(
        &self,
        current: &G::Node,
        old: &NodeResult<S, G::Store>,
        new_post: S,
        new_inner: G::Store,
        lub_budgets: &mut FxHashMap<G::Node, i64>,
    ) -> Result<(S, G::Store), FixpointError<G::Node>>
    where
        G: FixpointGraph<S>,
        G::Edge: SemanticEdge<S>,
        S: Lattice,
    {
        let use_lub = if self.widen_after == 0 {
            true
        } else {
            let budget = lub_budgets.entry(current.clone()).or_insert_with(|| {
                i64::from(self.widen_after) * self.graph.predecessors(current).count() as i64
            });
            let remaining = *budget;
            *budget -= 1;
            remaining > 0
        };

        let combined = if use_lub {
            new_post
                .lub(&old.post)
                .and_then(|post| Ok((post, new_inner.lub(&old.inner)?)))
        } else {
            old.post
                .widening(&new_post)
                .and_then(|post| Ok((post, old.inner.widening(&new_inner)?)))
        };
        combined.map_err(|source| FixpointError::Combination {
            node: current.clone(),
            source,
        })
    }
}

fn unexpected<N: Clone + Debug>(node: &N, source: SemanticError) -> FixpointError<N> {
    error!(node = ?node, error = %source, "unexpected failure during fixpoint computation");
    FixpointError::Unexpected {
        node: node.clone(),
        source,
    }
}
