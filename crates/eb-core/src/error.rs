//! Error handling for the Edgebreaker codec.
//!
//! This module provides the single crate-wide error type returned by every
//! fallible operation in `eb-core`, mirroring the error kinds named by the
//! codec's error handling design: malformed containers, unsupported mesh
//! shapes, quantization overflow, short reads, I/O failures, and API
//! contract violations.

use thiserror::Error;

/// The error type returned by every fallible `eb-core` operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EbError {
    /// The EB container violates a structural invariant: bad signature,
    /// truncated field, out-of-range code-series selector, a hole shorter
    /// than 3 vertices, or a corrupted section boundary.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The input mesh cannot be compressed by this codec: more than one
    /// connected component, a non-triangular face, or coincident vertices
    /// after quantization.
    #[error("unsupported mesh: {0}")]
    UnsupportedMesh(String),

    /// A quantized coordinate exceeded its per-axis bit budget, or a
    /// step-size coefficient would need more than 30 bits.
    #[error("overflow: {0}")]
    Overflow(String),

    /// The underlying byte source was exhausted mid-field.
    #[error("unexpected end of input")]
    Eof,

    /// The underlying byte sink returned an error, or the arithmetic coder
    /// failed to terminate.
    #[error("I/O error: {0}")]
    Io(String),

    /// An API contract was violated: bit count out of `[1,32]`, a bypass
    /// bit that was not 0 or 1, or a context id out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<std::io::Error> for EbError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            EbError::Eof
        } else {
            EbError::Io(err.to_string())
        }
    }
}

/// The result type used throughout `eb-core`.
pub type EbResult<T> = Result<T, EbError>;
