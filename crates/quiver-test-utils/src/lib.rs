mod chain;
mod graph;
mod interval;
pub mod lattice;
mod spy;

pub use chain::Chain;
pub use graph::{EdgeTransform, TestEdge, TestGraph};
pub use interval::{Bound, Interval};
pub use spy::{Spy, SpyCounters};
