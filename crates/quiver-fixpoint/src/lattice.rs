use std::collections::hash_map::Entry;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::SemanticError;

/// Element of a join-semilattice with widening.
///
/// No blanket or default widening is provided: every domain must define
/// its own widening operator.
///
/// ## Algebraic contracts
///
/// **Lub**: commutative, associative, idempotent least upper bound.
///
/// **Widening**: applied as `old.widening(new)`; the result is an upper
/// bound of both, and the ascending chain `x₀, x₀.widening(x₁),
/// (x₀.widening(x₁)).widening(x₂), ...` must stabilize in finite steps.
///
/// **Less-or-equal**: the partial order of the lattice, consistent with
/// lub (`a ⊑ b` iff `a ⊔ b = b`).
///
/// All binary operations may fail with a [`SemanticError`] when the domain
/// cannot carry them out; callers propagate such failures.
pub trait Lattice: Sized + Clone {
    /// Least upper bound of `self` and `other`.
    fn lub(&self, other: &Self) -> Result<Self, SemanticError>;

    /// Widen `self` with `next` to guarantee ascending chain termination.
    fn widening(&self, next: &Self) -> Result<Self, SemanticError>;

    /// Whether `self` is under `other` in the partial order.
    fn less_or_equal(&self, other: &Self) -> Result<bool, SemanticError>;

    /// Whether this is the least element of the lattice.
    fn is_bottom(&self) -> bool;
}

/// A lattice-valued map from inner nodes to abstract states.
///
/// Inner nodes are nodes semantically nested within an outer node (e.g.
/// sub-expressions of a statement). Transfer functions populate a store
/// with their states as a side effect; the engine only merges, widens and
/// enumerates the entries.
pub trait StateStore<N, S>: Lattice {
    /// All (inner node, state) entries of this store.
    fn entries<'a>(&'a self) -> impl Iterator<Item = (&'a N, &'a S)> + 'a
    where
        N: 'a,
        S: 'a;
}

/// Functional lattice backed by a hash map, lifting the operations of its
/// value lattice pointwise.
///
/// A key missing from one side is treated as bottom: lub and widening
/// carry the present value over unchanged, and `less_or_equal` holds for a
/// key absent from `other` only if the value under `self` is bottom.
#[derive(Debug, Clone)]
pub struct FunctionalLattice<K, S> {
    function: FxHashMap<K, S>,
}

impl<K, S> PartialEq for FunctionalLattice<K, S>
where
    K: Eq + Hash,
    S: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
    }
}

impl<K, S> Default for FunctionalLattice<K, S> {
    fn default() -> Self {
        Self {
            function: FxHashMap::default(),
        }
    }
}

impl<K, S> FunctionalLattice<K, S>
where
    K: Clone + Eq + Hash,
    S: Lattice,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `state`, returning the previous binding if any.
    pub fn insert(&mut self, key: K, state: S) -> Option<S> {
        self.function.insert(key, state)
    }

    pub fn get(&self, key: &K) -> Option<&S> {
        self.function.get(key)
    }

    pub fn len(&self) -> usize {
        self.function.len()
    }

    pub fn is_empty(&self) -> bool {
        self.function.is_empty()
    }
}

impl<K, S> Lattice for FunctionalLattice<K, S>
where
    K: Clone + Eq + Hash,
    S: Lattice,
{
    fn lub(&self, other: &Self) -> Result<Self, SemanticError> {
        let mut function = self.function.clone();
        for (key, state) in &other.function {
            match function.entry(key.clone()) {
                Entry::Occupied(mut bound) => {
                    let joined = bound.get().lub(state)?;
                    bound.insert(joined);
                }
                Entry::Vacant(slot) => {
                    slot.insert(state.clone());
                }
            }
        }
        Ok(Self { function })
    }

    fn widening(&self, next: &Self) -> Result<Self, SemanticError> {
        let mut function = self.function.clone();
        for (key, state) in &next.function {
            match function.entry(key.clone()) {
                Entry::Occupied(mut bound) => {
                    let widened = bound.get().widening(state)?;
                    bound.insert(widened);
                }
                Entry::Vacant(slot) => {
                    slot.insert(state.clone());
                }
            }
        }
        Ok(Self { function })
    }

    fn less_or_equal(&self, other: &Self) -> Result<bool, SemanticError> {
        for (key, state) in &self.function {
            match other.function.get(key) {
                Some(bound) => {
                    if !state.less_or_equal(bound)? {
                        return Ok(false);
                    }
                }
                None => {
                    if !state.is_bottom() {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    fn is_bottom(&self) -> bool {
        self.function.values().all(S::is_bottom)
    }
}

impl<K, S> StateStore<K, S> for FunctionalLattice<K, S>
where
    K: Clone + Eq + Hash,
    S: Lattice,
{
    fn entries<'a>(&'a self) -> impl Iterator<Item = (&'a K, &'a S)> + 'a
    where
        K: 'a,
        S: 'a,
    {
        self.function.iter()
    }
}
