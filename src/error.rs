use thiserror::Error;

/// Result alias used by the pruning core.
pub type PruneResult<T> = Result<T, PruneError>;

/// Input buffer that failed an integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("{buffer} has {actual} entries, expected {expected}")]
    BufferLength {
        buffer: String,
        expected: usize,
        actual: usize,
    },

    #[error("submesh {submesh} references vertex {index} (mesh has {vertex_count} vertices)")]
    IndexOutOfRange {
        submesh: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("submesh {submesh} has {len} indices, which is not a multiple of 3")]
    PartialTriangle { submesh: usize, len: usize },

    #[error("{submeshes} submeshes are paired with {materials} materials")]
    MaterialCount { submeshes: usize, materials: usize },
}

/// Errors returned by the pruning pipeline. No output is produced when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PruneError {
    #[error("input mesh failed integrity check: {0}")]
    InputIntegrity(#[from] IntegrityViolation),

    #[error(
        "no vertex survives pruning ({orphaned} orphaned, {grown} removed by island growth \
         of {vertex_count})"
    )]
    DegenerateResult {
        vertex_count: usize,
        orphaned: usize,
        grown: usize,
    },
}
