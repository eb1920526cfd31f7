mod adjacency;
mod graph;
mod workset;

pub use adjacency::AdjacencyMatrix;
pub use graph::{Edge, Graph};
pub use workset::{FifoWorkingSet, LifoWorkingSet, VisitOnceWorkingSet, WorkingSet};
