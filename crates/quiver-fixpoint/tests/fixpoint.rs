use rustc_hash::FxHashMap;

use quiver_fixpoint::{
    FixpointEngine, FixpointError, FunctionalLattice, Lattice, SemanticEdge, SemanticError,
};
use quiver_graph::{FifoWorkingSet, Graph, WorkingSet};
use quiver_test_utils::{Bound, Chain, EdgeTransform, Interval, Spy, TestGraph};

type IntervalStore = FunctionalLattice<u32, Interval>;

fn starting<S>(entries: &[(u32, S)]) -> FxHashMap<u32, S>
where
    S: Clone,
{
    entries.iter().cloned().collect()
}

/// `result[n]` must sit above the join of its edge-transformed predecessor
/// results and its seed, for every node.
fn assert_sound(
    graph: &TestGraph,
    seeds: &FxHashMap<u32, Interval>,
    result: &FxHashMap<u32, Interval>,
) {
    for (node, state) in result {
        let mut bound = seeds.get(node).copied();
        for pred in graph.predecessors(node) {
            let Some(pred_state) = result.get(pred) else {
                continue;
            };
            let edge = graph.edge_connecting(pred, node).unwrap();
            let contribution = edge.traverse(pred_state).unwrap();
            bound = Some(match bound {
                None => contribution,
                Some(so_far) => so_far.lub(&contribution).unwrap(),
            });
        }
        if let Some(bound) = bound {
            assert!(
                bound.less_or_equal(state).unwrap(),
                "result at {node} is unsound: {bound:?} not under {state:?}"
            );
        }
    }
}

#[test]
fn linear_chain_propagates_increments() {
    let mut graph = TestGraph::with_nodes(3);
    graph.add_edge(0, 1);
    graph.add_edge(1, 2);

    let mut visits = Vec::new();
    let result = FixpointEngine::new(&graph)
        .run(
            starting(&[(0, Interval::constant(0))]),
            &(),
            FifoWorkingSet::new(),
            |node: &u32,
             entry: &Interval,
             _: &(),
             _: &mut IntervalStore|
             -> Result<Interval, SemanticError> {
                visits.push(*node);
                Ok(match node {
                    0 => *entry,
                    _ => *entry + Interval::constant(1),
                })
            },
        )
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[&0], Interval::constant(0));
    assert_eq!(result[&1], Interval::constant(1));
    assert_eq!(result[&2], Interval::constant(2));
    assert_eq!(visits, vec![0, 1, 2]);
}

#[test]
fn branches_join_at_merge_point() {
    let mut graph = TestGraph::with_nodes(4);
    graph.add_edge(0, 1);
    graph.add_edge(0, 2);
    graph.add_edge(1, 3);
    graph.add_edge(2, 3);

    let result = FixpointEngine::new(&graph)
        .run(
            starting(&[(0, Interval::constant(0))]),
            &(),
            FifoWorkingSet::new(),
            |node: &u32,
             entry: &Interval,
             _: &(),
             _: &mut IntervalStore|
             -> Result<Interval, SemanticError> {
                Ok(match node {
                    1 => Interval::constant(1),
                    2 => Interval::constant(2),
                    _ => *entry,
                })
            },
        )
        .unwrap();

    assert_eq!(result[&3], Interval::new(1, 2));
}

#[test]
fn self_loop_converges_under_widening() {
    let mut graph = TestGraph::with_nodes(3);
    graph.add_edge(0, 1);
    graph.add_edge(1, 1);
    graph.add_edge(1, 2);

    let result = FixpointEngine::new(&graph)
        .with_widening_threshold(3)
        .run(
            starting(&[(0, Interval::constant(0))]),
            &(),
            FifoWorkingSet::new(),
            |node: &u32,
             entry: &Interval,
             _: &(),
             _: &mut IntervalStore|
             -> Result<Interval, SemanticError> {
                Ok(match node {
                    1 => *entry + Interval::constant(1),
                    _ => *entry,
                })
            },
        )
        .unwrap();

    assert_eq!(result[&0], Interval::constant(0));
    assert_eq!(result[&1], Interval::half_bounded_below(1));
    assert_eq!(result[&2], Interval::half_bounded_below(1));
}

#[test]
fn widening_is_applied_once_budget_runs_out() {
    let mut graph = TestGraph::with_nodes(2);
    graph.add_edge(0, 1);
    graph.add_edge(1, 1);

    let (seed, counters) = Spy::new(Interval::constant(0));
    let result = FixpointEngine::new(&graph)
        .with_widening_threshold(3)
        .run(
            starting(&[(0, seed)]),
            &(),
            FifoWorkingSet::new(),
            |node: &u32,
             entry: &Spy<Interval>,
             _: &(),
             _: &mut FunctionalLattice<u32, Spy<Interval>>|
             -> Result<Spy<Interval>, SemanticError> {
                match node {
                    1 => entry.try_map(|interval| Ok(*interval + Interval::constant(1))),
                    _ => Ok(entry.clone()),
                }
            },
        )
        .unwrap();

    assert!(counters.widenings() > 0);
    assert_eq!(result[&1].value().hi, Bound::PosInf);
}

#[test]
fn zero_threshold_always_lubs() {
    let mut graph = TestGraph::with_nodes(3);
    graph.add_edge(0, 1);
    graph.add_edge(1, 1);
    graph.add_edge(1, 2);

    let (seed, counters) = Spy::new(Chain::new(0));
    let mut loop_visits = 0;
    let mut loop_entries = Vec::new();
    let result = FixpointEngine::new(&graph)
        .with_widening_threshold(0)
        .run(
            starting(&[(0, seed)]),
            &(),
            FifoWorkingSet::new(),
            |node: &u32,
             entry: &Spy<Chain>,
             _: &(),
             _: &mut FunctionalLattice<u32, Spy<Chain>>|
             -> Result<Spy<Chain>, SemanticError> {
                match node {
                    1 => {
                        loop_visits += 1;
                        loop_entries.push(*entry.value());
                        entry.try_map(|chain| Ok(chain.bump()))
                    }
                    _ => Ok(entry.clone()),
                }
            },
        )
        .unwrap();

    // the chain stabilizes after ten growing revisits
    assert_eq!(loop_visits, 11);
    assert_eq!(*result[&1].value(), Chain::new(Chain::CAP));
    assert_eq!(*result[&2].value(), Chain::new(Chain::CAP));
    // widening must never be consulted with a zero threshold
    assert_eq!(counters.widenings(), 0);
    assert!(counters.lubs() > 0);
    // stored growth is monotone under pure lub iteration
    for window in loop_entries.windows(2) {
        assert!(window[0].less_or_equal(&window[1]).unwrap());
    }
}

#[test]
fn edge_transform_is_applied_on_traversal() {
    let mut graph = TestGraph::with_nodes(2);
    graph.add_edge_with(0, 1, EdgeTransform::Scale(2));

    let result = FixpointEngine::new(&graph)
        .run(
            starting(&[(0, Interval::constant(3))]),
            &(),
            FifoWorkingSet::new(),
            |_: &u32,
             entry: &Interval,
             _: &(),
             _: &mut IntervalStore|
             -> Result<Interval, SemanticError> { Ok(*entry) },
        )
        .unwrap();

    assert_eq!(result[&1], Interval::constant(6));
}

#[test]
fn transfer_failure_aborts_the_computation() {
    let mut graph = TestGraph::with_nodes(3);
    graph.add_edge(0, 1);
    graph.add_edge(1, 2);

    let outcome = FixpointEngine::new(&graph).run(
        starting(&[(0, Interval::constant(0))]),
        &(),
        FifoWorkingSet::new(),
        |node: &u32,
         entry: &Interval,
         _: &(),
         _: &mut IntervalStore|
         -> Result<Interval, SemanticError> {
            if *node == 1 {
                Err(SemanticError::new("unsupported statement"))
            } else {
                Ok(*entry)
            }
        },
    );

    assert!(matches!(
        outcome,
        Err(FixpointError::Transfer { node: 1, .. })
    ));
}

#[test]
fn empty_graph_yields_empty_result() {
    let graph = TestGraph::new();
    let seeds: FxHashMap<u32, Interval> = FxHashMap::default();

    let result = FixpointEngine::new(&graph)
        .run(
            seeds,
            &(),
            FifoWorkingSet::new(),
            |_: &u32,
             entry: &Interval,
             _: &(),
             _: &mut IntervalStore|
             -> Result<Interval, SemanticError> { Ok(*entry) },
        )
        .unwrap();

    assert!(result.is_empty());
}

#[test]
fn single_node_maps_to_its_post_state() {
    let graph = TestGraph::with_nodes(1);

    let result = FixpointEngine::new(&graph)
        .run(
            starting(&[(0, Interval::constant(7))]),
            &(),
            FifoWorkingSet::new(),
            |_: &u32,
             entry: &Interval,
             _: &(),
             _: &mut IntervalStore|
             -> Result<Interval, SemanticError> {
                Ok(*entry + Interval::constant(1))
            },
        )
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[&0], Interval::constant(8));
}

#[test]
fn foreign_starting_node_is_rejected() {
    let graph = TestGraph::with_nodes(1);

    let outcome = FixpointEngine::new(&graph).run(
        starting(&[(5, Interval::constant(0))]),
        &(),
        FifoWorkingSet::new(),
        |_: &u32,
         entry: &Interval,
         _: &(),
         _: &mut IntervalStore|
         -> Result<Interval, SemanticError> { Ok(*entry) },
    );

    assert!(matches!(
        outcome,
        Err(FixpointError::UnknownNode { node: Some(5) })
    ));
}

#[test]
fn lying_working_set_is_rejected() {
    struct BrokenWorkingSet;

    impl WorkingSet<u32> for BrokenWorkingSet {
        fn push(&mut self, _node: u32) {}

        fn pop(&mut self) -> Option<u32> {
            None
        }

        fn len(&self) -> usize {
            1
        }
    }

    let graph = TestGraph::with_nodes(1);
    let outcome = FixpointEngine::new(&graph).run(
        starting(&[(0, Interval::constant(0))]),
        &(),
        BrokenWorkingSet,
        |_: &u32,
         entry: &Interval,
         _: &(),
         _: &mut IntervalStore|
         -> Result<Interval, SemanticError> { Ok(*entry) },
    );

    assert!(matches!(
        outcome,
        Err(FixpointError::UnknownNode { node: None })
    ));
}

fn loop_with_edge_increment() -> TestGraph {
    let mut graph = TestGraph::with_nodes(3);
    graph.add_edge(0, 1);
    graph.add_edge_with(1, 1, EdgeTransform::Add(1));
    graph.add_edge(1, 2);
    graph
}

fn identity_transfer(
    _: &u32,
    entry: &Interval,
    _: &(),
    _: &mut IntervalStore,
) -> Result<Interval, SemanticError> {
    Ok(*entry)
}

#[test]
fn results_stay_above_their_predecessor_contributions() {
    let graph = loop_with_edge_increment();
    let seeds = starting(&[(0, Interval::constant(0))]);

    let result = FixpointEngine::new(&graph)
        .with_widening_threshold(3)
        .run(seeds.clone(), &(), FifoWorkingSet::new(), identity_transfer)
        .unwrap();

    assert_sound(&graph, &seeds, &result);
    assert_eq!(result[&1].hi, Bound::PosInf);
}

#[test]
fn identical_runs_return_identical_results() {
    let graph = loop_with_edge_increment();
    let seeds = starting(&[(0, Interval::constant(0))]);

    let engine = FixpointEngine::new(&graph).with_widening_threshold(3);
    let first = engine
        .run(seeds.clone(), &(), FifoWorkingSet::new(), identity_transfer)
        .unwrap();
    let second = engine
        .run(seeds, &(), FifoWorkingSet::new(), identity_transfer)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn rerunning_from_the_result_is_a_fixpoint() {
    let mut graph = TestGraph::with_nodes(4);
    graph.add_edge(0, 1);
    graph.add_edge(0, 2);
    graph.add_edge(1, 3);
    graph.add_edge(2, 3);

    let transfer = |node: &u32,
                    entry: &Interval,
                    _: &(),
                    _: &mut IntervalStore|
     -> Result<Interval, SemanticError> {
        Ok(match node {
            1 => Interval::constant(1),
            2 => Interval::constant(2),
            _ => *entry,
        })
    };

    let engine = FixpointEngine::new(&graph);
    let first = engine
        .run(
            starting(&[(0, Interval::constant(0))]),
            &(),
            FifoWorkingSet::new(),
            transfer,
        )
        .unwrap();
    let again = engine
        .run(first.clone(), &(), FifoWorkingSet::new(), transfer)
        .unwrap();

    assert_eq!(first, again);
}

#[test]
fn inner_node_states_are_flattened_into_the_result() {
    let mut graph = TestGraph::with_nodes(2);
    graph.add_edge(0, 1);

    let result = FixpointEngine::new(&graph)
        .run(
            starting(&[(0, Interval::constant(0))]),
            &(),
            FifoWorkingSet::new(),
            |node: &u32,
             entry: &Interval,
             _: &(),
             store: &mut IntervalStore|
             -> Result<Interval, SemanticError> {
                // record the entry state on a sub-expression node
                store.insert(100 + node, *entry);
                Ok(*entry + Interval::constant(1))
            },
        )
        .unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(result[&0], Interval::constant(1));
    assert_eq!(result[&1], Interval::constant(2));
    assert_eq!(result[&100], Interval::constant(0));
    assert_eq!(result[&101], Interval::constant(1));
}
