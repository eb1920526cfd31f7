use std::fmt::Debug;

/// A failure raised by a client abstract domain or transfer function.
///
/// Domain-specific causes (unsupported expressions, incompatible states)
/// are attached as a boxed source via [`SemanticError::with_source`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SemanticError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SemanticError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an arbitrary error with a contextual message.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Error type for fixpoint computation failures.
///
/// Any of these aborts the whole computation: no partial result is
/// returned, nothing is retried, and no stored state is modified by the
/// failure. Every variant carries the identity of the node being processed
/// when one exists.
#[derive(Debug, thiserror::Error)]
pub enum FixpointError<N: Debug> {
    /// The working set yielded a node that is not part of the graph, or
    /// nothing at all despite reporting itself non-empty.
    #[error("unknown node {node:?} encountered during fixpoint execution")]
    UnknownNode { node: Option<N> },
    /// The node has neither a starting entry state nor a predecessor with a
    /// stored result.
    #[error("{node:?} does not have an entry state")]
    MissingEntryState { node: N },
    /// The transfer function signalled a computation failure.
    #[error("semantics computation failed on {node:?}")]
    Transfer {
        node: N,
        #[source]
        source: SemanticError,
    },
    /// Joining the edge-transformed predecessor states failed.
    #[error("failed to compute the entry state for {node:?}")]
    EntryState {
        node: N,
        #[source]
        source: SemanticError,
    },
    /// Combining the stored and freshly computed approximations failed.
    #[error("failed to update the analysis results for {node:?}")]
    Combination {
        node: N,
        #[source]
        source: SemanticError,
    },
    /// Any other failure during the iteration.
    #[error("unexpected failure during fixpoint computation on {node:?}")]
    Unexpected {
        node: N,
        #[source]
        source: SemanticError,
    },
}
