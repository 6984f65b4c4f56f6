//! Error types for Cauchy-Reed-Solomon coding operations.

/// Errors that can occur during erasure encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodingError {
    /// Parameter invariants violated: `k` and `m` must be at least 1,
    /// `k + m` at most 256, and the block size a positive multiple of 8.
    #[error("invalid parameters: k={k}, m={m}, block_bytes={block_bytes}")]
    InvalidParameters {
        /// Number of data blocks requested.
        k: usize,
        /// Number of recovery blocks requested.
        m: usize,
        /// Bytes per block requested.
        block_bytes: usize,
    },

    /// A required input buffer is absent or has the wrong shape.
    #[error("required buffer absent or mis-shaped: {0}")]
    NullData(&'static str),

    /// `encode`/`decode` called before [`initialize`](crate::initialize).
    #[error("GF(256) context not initialized; call initialize() first")]
    UninitializedContext,

    /// Not enough present blocks to reconstruct the missing data.
    #[error("not enough blocks for recovery: have {have}, need {need}")]
    InsufficientBlocks {
        /// Usable blocks actually present.
        have: usize,
        /// Blocks required for reconstruction.
        need: usize,
    },

    /// A matrix operation failed, e.g. the recovery submatrix was singular.
    #[error("matrix operation failed: {0}")]
    MatrixOperation(String),

    /// The caller's block container could not hold a reconstructed block,
    /// or a payload vanished mid-reconstruction.
    #[error("block buffer error: {0}")]
    BlockBuffer(&'static str),
}
