use thiserror::Error;

/// Top-level error type for the wingmesh kernel.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised when the winged-edge bookkeeping is used incorrectly.
///
/// These are precondition violations: the mesh is left untouched and the
/// caller is expected to fix its usage rather than retry.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// A face references an edge the index does not know about. Usually
    /// means `rebuild_index()` was skipped after a bulk edit.
    #[error("edge between vertices {a} and {b} is missing from the edge index")]
    EdgeNotIndexed { a: u32, b: u32 },

    #[error("operation requires a mesh with edge topology")]
    MissingTopology,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to mesh operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while reading or writing binary mesh files.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header: expected {expected} bytes, got {got}")]
    InvalidHeader { expected: usize, got: usize },

    #[error("unexpected end of file at byte {position}")]
    UnexpectedEof { position: u64 },

    #[error("invalid file content: {0}")]
    InvalidContent(String),
}

impl From<std::io::Error> for MeshError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Io(err))
    }
}

/// Convenience type alias for results using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;
