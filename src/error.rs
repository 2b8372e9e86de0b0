//! Error types for `bitknit`

use thiserror::Error;

/// The error type for `bitknit` operations.
///
/// Any error aborts the whole decode: a desynchronized coder state cannot
/// be repaired mid-stream, so there is no partial-success or retry path.
/// On failure the contents of the output buffer are unspecified.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== Precondition Errors ====================
    /// The compressed input is too short to hold even the stream magic.
    #[error("compressed input too small: {len} bytes")]
    InputTooSmall {
        /// Length of the compressed input in bytes.
        len: usize,
    },

    /// The caller asked for zero decompressed bytes.
    #[error("decompressed size must be greater than zero")]
    EmptyOutput,

    // ==================== Stream Format Errors ====================
    /// The stream does not start with the `BitKnit` magic word.
    #[error("invalid BitKnit magic: expected 0x75b1, found {found:#06x}")]
    InvalidMagic {
        /// The 16-bit value found where the magic was expected.
        found: u16,
    },

    /// A coded quantum header decoded to a value below the coder's
    /// renormalization threshold.
    #[error("invalid quantum header value: {value:#x}")]
    InvalidQuantumHeader {
        /// The rotated 32-bit header value.
        value: u32,
    },

    /// The interleaved coder states did not flush back to their base
    /// value at a quantum boundary.
    #[error("coder state mismatch at quantum end: state1={state1:#x}, state2={state2:#x}")]
    QuantumStateMismatch {
        /// First coder state at the boundary.
        state1: u32,
        /// Second coder state at the boundary.
        state2: u32,
    },

    // ==================== Bounds Errors ====================
    /// A required read would pass the end of the compressed input.
    #[error("unexpected end of compressed input")]
    UnexpectedEof,

    /// A decoded copy would write past the end of the output buffer.
    #[error("copy of {length} bytes at position {position} exceeds output size {capacity}")]
    OutputOverflow {
        /// Output position where the copy starts.
        position: usize,
        /// Length of the copy in bytes.
        length: usize,
        /// Total output size in bytes.
        capacity: usize,
    },

    /// A decoded match distance is zero or reaches back past the start
    /// of the output produced so far.
    #[error("match distance {distance} invalid at output position {position}")]
    InvalidMatchDistance {
        /// The decoded distance.
        distance: u32,
        /// Output position at the time of the match.
        position: usize,
    },
}

/// A specialized Result type for `bitknit` operations.
pub type Result<T> = std::result::Result<T, Error>;
