use std::collections::VecDeque;
use std::hash::Hash;

use rustc_hash::FxHashSet;

/// Mutable collection of nodes pending (re)processing.
///
/// Pop order is the primary precision/performance tuning knob of a worklist
/// algorithm; consumers make no correctness assumption about it. Duplicate
/// pushes are permitted; implementations may deduplicate but are not
/// required to.
pub trait WorkingSet<N> {
    fn push(&mut self, node: N);

    fn pop(&mut self) -> Option<N>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First-in-first-out working set.
#[derive(Debug, Clone)]
pub struct FifoWorkingSet<N> {
    queue: VecDeque<N>,
}

impl<N> Default for FifoWorkingSet<N> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<N> FifoWorkingSet<N> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<N> WorkingSet<N> for FifoWorkingSet<N> {
    fn push(&mut self, node: N) {
        self.queue.push_back(node);
    }

    fn pop(&mut self) -> Option<N> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Last-in-first-out working set.
#[derive(Debug, Clone)]
pub struct LifoWorkingSet<N> {
    stack: Vec<N>,
}

impl<N> Default for LifoWorkingSet<N> {
    fn default() -> Self {
        Self { stack: Vec::new() }
    }
}

impl<N> LifoWorkingSet<N> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<N> WorkingSet<N> for LifoWorkingSet<N> {
    fn push(&mut self, node: N) {
        self.stack.push(node);
    }

    fn pop(&mut self) -> Option<N> {
        self.stack.pop()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}

/// Wrapper that drops pushes of nodes it has already seen, so every node is
/// processed at most once over the lifetime of the set.
///
/// Note that this changes fixpoint semantics: a node cannot be re-enqueued
/// after one of its predecessors grows. It fits single-pass traversals, not
/// iterative analyses.
#[derive(Debug, Clone)]
pub struct VisitOnceWorkingSet<N, W = FifoWorkingSet<N>> {
    inner: W,
    seen: FxHashSet<N>,
}

impl<N, W: Default> Default for VisitOnceWorkingSet<N, W> {
    fn default() -> Self {
        Self {
            inner: W::default(),
            seen: FxHashSet::default(),
        }
    }
}

impl<N, W: Default> VisitOnceWorkingSet<N, W> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<N, W> WorkingSet<N> for VisitOnceWorkingSet<N, W>
where
    N: Clone + Eq + Hash,
    W: WorkingSet<N>,
{
    fn push(&mut self, node: N) {
        if self.seen.insert(node.clone()) {
            self.inner.push(node);
        }
    }

    fn pop(&mut self) -> Option<N> {
        self.inner.pop()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
