mod error;
mod fixpoint;
mod lattice;
mod semantics;

pub use error::{FixpointError, SemanticError};
pub use fixpoint::{FixpointEngine, DEFAULT_WIDENING_THRESHOLD};
pub use lattice::{FunctionalLattice, Lattice, StateStore};
pub use semantics::{FixpointGraph, SemanticEdge, SemanticFunction};
