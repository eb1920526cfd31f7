use std::cell::Cell;
use std::rc::Rc;

use quiver_fixpoint::{Lattice, SemanticError};

/// Operation counters shared by every state descended from one [`Spy`]
/// seed, through clones, lubs and widenings alike.
#[derive(Debug, Default)]
pub struct SpyCounters {
    lubs: Cell<usize>,
    widenings: Cell<usize>,
    comparisons: Cell<usize>,
}

impl SpyCounters {
    pub fn lubs(&self) -> usize {
        self.lubs.get()
    }

    pub fn widenings(&self) -> usize {
        self.widenings.get()
    }

    pub fn comparisons(&self) -> usize {
        self.comparisons.get()
    }
}

/// Lattice wrapper recording how often each operation is invoked.
///
/// Useful for asserting *which* operations an algorithm performed, e.g.
/// that widening is never reached when the threshold is zero.
#[derive(Debug, Clone)]
pub struct Spy<L> {
    value: L,
    counters: Rc<SpyCounters>,
}

impl<L> Spy<L> {
    /// Wrap a seed value, returning the wrapper and a handle on the
    /// counters it will share with all derived states.
    pub fn new(value: L) -> (Self, Rc<SpyCounters>) {
        let counters = Rc::new(SpyCounters::default());
        (
            Self {
                value,
                counters: Rc::clone(&counters),
            },
            counters,
        )
    }

    pub fn value(&self) -> &L {
        &self.value
    }

    /// Apply a fallible transformation to the wrapped value, keeping the
    /// counter handle.
    pub fn try_map(
        &self,
        f: impl FnOnce(&L) -> Result<L, SemanticError>,
    ) -> Result<Self, SemanticError> {
        Ok(Self {
            value: f(&self.value)?,
            counters: Rc::clone(&self.counters),
        })
    }
}

impl<L: PartialEq> PartialEq for Spy<L> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<L: Lattice> Lattice for Spy<L> {
    fn lub(&self, other: &Self) -> Result<Self, SemanticError> {
        self.counters.lubs.set(self.counters.lubs.get() + 1);
        Ok(Self {
            value: self.value.lub(&other.value)?,
            counters: Rc::clone(&self.counters),
        })
    }

    fn widening(&self, next: &Self) -> Result<Self, SemanticError> {
        self.counters.widenings.set(self.counters.widenings.get() + 1);
        Ok(Self {
            value: self.value.widening(&next.value)?,
            counters: Rc::clone(&self.counters),
        })
    }

    fn less_or_equal(&self, other: &Self) -> Result<bool, SemanticError> {
        self.counters.comparisons.set(self.counters.comparisons.get() + 1);
        self.value.less_or_equal(&other.value)
    }

    fn is_bottom(&self) -> bool {
        self.value.is_bottom()
    }
}
