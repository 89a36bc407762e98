//! Error types for element tree operations

use std::collections::TryReserveError;

/// Result type for element tree operations
pub type DomResult<T> = Result<T, DomError>;

/// Element tree operation errors
///
/// A failed operation leaves the tree exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Splice out of bounds: index {index}, delete count {delete_count}, length {len}")]
    SpliceOutOfBounds {
        index: usize,
        delete_count: usize,
        len: usize,
    },

    #[error("Node is not a child of this node")]
    NotAChild,

    #[error("Node has no parent")]
    Detached,

    #[error("Hierarchy request error: node would become its own ancestor")]
    HierarchyRequest,

    #[error("Unknown element handle: {0}")]
    UnknownHandle(u32),

    #[error("Serialized output exceeds {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("Child store cannot hold more than {limit} items")]
    CapacityOverflow { limit: usize },

    #[error("Container allocation failed: {0}")]
    AllocationFailed(#[from] TryReserveError),
}
