//! Dataflow domains for *possible* (may) forward analyses.
//!
//! A possible analysis keeps the union of the facts flowing along every
//! path, so its domain is a set lattice whose join is set union. Classic
//! instances are reaching definitions and available expressions computed as
//! may-information.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashSet;

use quiver_fixpoint::{Lattice, SemanticError};

/// A fact tracked by a dataflow analysis, tied to the identifier it talks
/// about so that assignments can kill the facts of the overwritten
/// identifier.
pub trait DataflowElement: Clone + Eq + Hash + Debug {
    type Id: Eq + Hash + ?Sized;

    fn identifier(&self) -> &Self::Id;
}

/// Domain for forward and possible dataflow analyses: a set of
/// [`DataflowElement`]s joined by union, with a distinguished top above
/// every set.
#[derive(Debug, Clone, PartialEq)]
pub struct PossibleForwardDomain<E: DataflowElement> {
    elements: FxHashSet<E>,
    is_top: bool,
}

impl<E: DataflowElement> PossibleForwardDomain<E> {
    /// The empty set: no fact holds on any path.
    pub fn bottom() -> Self {
        Self {
            elements: FxHashSet::default(),
            is_top: false,
        }
    }

    pub fn top() -> Self {
        Self {
            elements: FxHashSet::default(),
            is_top: true,
        }
    }

    pub fn from_elements(elements: impl IntoIterator<Item = E>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
            is_top: false,
        }
    }

    pub fn is_top(&self) -> bool {
        self.is_top
    }

    pub fn contains(&self, element: &E) -> bool {
        self.elements.contains(element)
    }

    pub fn elements(&self) -> impl Iterator<Item = &E> + '_ {
        self.elements.iter()
    }

    /// Kill every fact about `id`, then generate the given facts: the
    /// transfer of an assignment to `id`.
    pub fn assign(&self, id: &E::Id, gen: impl IntoIterator<Item = E>) -> Self {
        let mut updated = self.forget_identifier(id);
        updated.elements.extend(gen);
        updated.is_top = false;
        updated
    }

    /// Drop every fact whose identifier is `id`.
    pub fn forget_identifier(&self, id: &E::Id) -> Self {
        if self.is_top {
            return self.clone();
        }
        Self {
            elements: self
                .elements
                .iter()
                .filter(|e| e.identifier() != id)
                .cloned()
                .collect(),
            is_top: false,
        }
    }
}

impl<E: DataflowElement> Lattice for PossibleForwardDomain<E> {
    fn lub(&self, other: &Self) -> Result<Self, SemanticError> {
        if self.is_top || other.is_top {
            return Ok(Self::top());
        }
        let mut elements = self.elements.clone();
        elements.extend(other.elements.iter().cloned());
        Ok(Self {
            elements,
            is_top: false,
        })
    }

    // the powerset of the element universe has finite height, so union
    // already terminates
    fn widening(&self, next: &Self) -> Result<Self, SemanticError> {
        self.lub(next)
    }

    fn less_or_equal(&self, other: &Self) -> Result<bool, SemanticError> {
        if other.is_top {
            return Ok(true);
        }
        if self.is_top {
            return Ok(false);
        }
        Ok(self.elements.is_subset(&other.elements))
    }

    fn is_bottom(&self) -> bool {
        !self.is_top && self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_test_utils::lattice::assert_lattice_laws;

    /// A reaching definition: `var` was assigned at `site`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Def {
        var: &'static str,
        site: u32,
    }

    impl Def {
        fn new(var: &'static str, site: u32) -> Self {
            Self { var, site }
        }
    }

    impl DataflowElement for Def {
        type Id = str;

        fn identifier(&self) -> &str {
            self.var
        }
    }

    #[test]
    fn possible_domain_lattice_laws() {
        assert_lattice_laws(&[
            PossibleForwardDomain::bottom(),
            PossibleForwardDomain::from_elements([Def::new("x", 1)]),
            PossibleForwardDomain::from_elements([Def::new("x", 1), Def::new("y", 2)]),
            PossibleForwardDomain::from_elements([Def::new("y", 3)]),
            PossibleForwardDomain::top(),
        ]);
    }

    #[test]
    fn assign_kills_then_generates() {
        let domain =
            PossibleForwardDomain::from_elements([Def::new("x", 1), Def::new("y", 2)]);
        let assigned = domain.assign("x", [Def::new("x", 7)]);
        assert!(assigned.contains(&Def::new("x", 7)));
        assert!(!assigned.contains(&Def::new("x", 1)));
        assert!(assigned.contains(&Def::new("y", 2)));
    }

    #[test]
    fn join_is_union() {
        let left = PossibleForwardDomain::from_elements([Def::new("x", 1)]);
        let right = PossibleForwardDomain::from_elements([Def::new("x", 4)]);
        let joined = left.lub(&right).unwrap();
        assert!(joined.contains(&Def::new("x", 1)));
        assert!(joined.contains(&Def::new("x", 4)));
    }

    #[test]
    fn top_absorbs() {
        let facts = PossibleForwardDomain::from_elements([Def::new("x", 1)]);
        let joined = facts.lub(&PossibleForwardDomain::top()).unwrap();
        assert!(joined.is_top());
        assert!(facts.less_or_equal(&PossibleForwardDomain::top()).unwrap());
        assert!(!PossibleForwardDomain::top().less_or_equal(&facts).unwrap());
    }
}
