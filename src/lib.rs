//! # bitknit
//!
//! A pure-Rust, clean-room decoder for raw `BitKnit` streams as stored
//! in Granny2 (GR2) model files.
//!
//! `BitKnit` is an LZ77 codec with adaptive rANS entropy coding: two
//! interleaved coder states, per-symbol adaptive probability models,
//! delta-coded literals, and a move-to-front cache of recent match
//! distances. GR2 sections store these streams raw, with no container
//! framing; the section header supplies the decompressed size, and this
//! crate turns the `(compressed bytes, decompressed size)` pair back
//! into the original bytes.
//!
//! ## Quick Start
//!
//! ```
//! // A stream holding one stored quantum: magic, zero marker, then the
//! // bytes verbatim.
//! let mut stream = vec![0xB1, 0x75, 0x00, 0x00];
//! stream.extend_from_slice(b"hello world");
//!
//! let data = bitknit::decompress(&stream, 11)?;
//! assert_eq!(data, b"hello world");
//! # Ok::<(), bitknit::Error>(())
//! ```
//!
//! Decoding into a caller-owned buffer avoids the allocation:
//!
//! ```
//! # let mut stream = vec![0xB1, 0x75, 0x00, 0x00];
//! # stream.extend_from_slice(b"hello world");
//! let mut buffer = [0u8; 11];
//! bitknit::decompress_into(&stream, &mut buffer)?;
//! assert_eq!(&buffer, b"hello world");
//! # Ok::<(), bitknit::Error>(())
//! ```
//!
//! Decoding is single-shot and self-contained: no state survives across
//! calls, nothing is allocated during the decode itself, and separate
//! calls may run on separate threads freely.

pub mod error;

mod decompress;
mod model;
mod rans;

// Re-exports for convenience
pub use decompress::{decompress, decompress_into};
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
