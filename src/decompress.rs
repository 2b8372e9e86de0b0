//! `BitKnit` stream decoding: quantum loop, LZ reconstruction, and the
//! public decompression entry points.
//!
//! A stream is a 16-bit magic word followed by a sequence of quanta,
//! each covering up to 64KB of output. A quantum is either stored (a
//! zero marker word, then the bytes verbatim) or coded. Coded quanta
//! interleave literals and matches:
//!
//! - Literals are delta-coded against the byte one last-used copy
//!   distance behind the write position, so runs of nearly-identical
//!   structures (vertex strides, index patterns) collapse onto a few
//!   hot symbols.
//! - Match distances go through an 8-entry recency cache; repeated
//!   offsets, the common case in mesh data, cost one small symbol.
//!
//! Models and the distance cache persist across quanta within one
//! decode call; the coder state pair is rebuilt from each quantum
//! header and must flush back to its base value at the quantum
//! boundary, which doubles as an integrity check on the whole quantum.

use crate::error::{Error, Result};
use crate::model::{LiteralModel, OffsetBitsModel, OffsetLowModel};
use crate::rans::{RansDecoder, WordReader};

// ============================================================================
// Constants
// ============================================================================

/// `BitKnit` stream magic (little-endian).
const BITKNIT_MAGIC: u16 = 0x75b1;

/// Quantum size: each quantum covers up to 64KB of output.
const QUANTUM_SIZE: usize = 0x10000;

// ============================================================================
// Recent-Distance Cache
// ============================================================================

/// Move-to-front cache of the 8 most recent match distances.
///
/// The ranking lives in a 24-bit packed permutation, 3 bits per rank,
/// so reordering is a couple of shifts instead of moving the distances
/// themselves.
struct RecentDistances {
    entries: [u32; 8],
    order: u32,
}

impl RecentDistances {
    fn new() -> Self {
        Self {
            entries: [1; 8],
            order: (1 << 3)
                | (2 << (2 * 3))
                | (3 << (3 * 3))
                | (4 << (4 * 3))
                | (5 << (5 * 3))
                | (6 << (6 * 3))
                | (7 << (7 * 3)),
        }
    }

    /// Fetch the distance ranked `rank` and move its slot to the front.
    fn hit(&mut self, rank: usize) -> u32 {
        let slot = (self.order >> (3 * rank)) & 7;
        let span = (8 << (3 * rank)) - 1;
        self.order = (self.order & !span) | (((self.order << 3) | slot) & span);
        self.entries[slot as usize]
    }

    /// Insert a freshly decoded distance over the two oldest slots: the
    /// second-oldest is demoted into the oldest and then replaced. The
    /// ranking itself does not change.
    fn insert(&mut self, distance: u32) {
        let oldest = (self.order >> 21) & 7;
        let second = (self.order >> 18) & 7;
        self.entries[oldest as usize] = self.entries[second as usize];
        self.entries[second as usize] = distance;
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// All state for one decompression call. Nothing survives across calls.
struct BitknitDecoder<'a> {
    output: &'a mut [u8],
    index: usize,
    literal_models: [LiteralModel; 4],
    offset_low_models: [OffsetLowModel; 4],
    offset_bits_model: OffsetBitsModel,
    recent: RecentDistances,
    last_offset: usize,
}

impl<'a> BitknitDecoder<'a> {
    fn new(output: &'a mut [u8]) -> Self {
        Self {
            output,
            index: 0,
            literal_models: std::array::from_fn(|_| LiteralModel::new()),
            offset_low_models: std::array::from_fn(|_| OffsetLowModel::new()),
            offset_bits_model: OffsetBitsModel::new(),
            recent: RecentDistances::new(),
            last_offset: 1,
        }
    }

    /// Decode one quantum: everything up to the next 64KB output
    /// boundary, or to the end of the output for the final quantum.
    fn decode_quantum(&mut self, stream: &mut WordReader) -> Result<()> {
        let quantum_end = ((self.index & !(QUANTUM_SIZE - 1)) + QUANTUM_SIZE).min(self.output.len());

        // A zero marker word selects a stored quantum.
        if stream.peek()? == 0 {
            stream.pop()?;
            tracing::trace!("stored quantum: {}..{}", self.index, quantum_end);
            let chunk = stream.take(quantum_end - self.index)?;
            self.output[self.index..quantum_end].copy_from_slice(chunk);
            self.index = quantum_end;
            return Ok(());
        }

        let mut rans = RansDecoder::from_header(stream)?;
        tracing::trace!("coded quantum: {}..{}", self.index, quantum_end);

        // Every coded quantum opens with one raw byte pulled straight
        // from the coder state, seeding the delta base for literals.
        self.output[self.index] = rans.pop_raw_bits(stream, 8)? as u8;
        self.index += 1;

        while self.index < quantum_end {
            let model_index = self.index & 3;
            let sym = rans.pop_symbol(&mut self.literal_models[model_index], stream)?;
            if sym < 256 {
                let base = self.output[self.index - self.last_offset];
                self.output[self.index] = base.wrapping_add(sym as u8);
                self.index += 1;
            } else {
                self.decode_copy(stream, &mut rans, sym, model_index)?;
            }
        }

        rans.check_flushed()
    }

    /// Decode a match: length code, then distance, then the copy.
    fn decode_copy(
        &mut self,
        stream: &mut WordReader,
        rans: &mut RansDecoder,
        sym: usize,
        model_index: usize,
    ) -> Result<()> {
        let copy_length = if sym < 288 {
            sym - 254
        } else {
            // Extended lengths carry sym - 287 raw bits.
            let count = (sym - 287) as u32;
            let extra = rans.pop_raw_bits(stream, count)? as usize;
            extra + (1 << count) + 32
        };

        let dist_sym = rans.pop_symbol(&mut self.offset_low_models[model_index], stream)?;
        let distance = if dist_sym < 8 {
            self.recent.hit(dist_sym)
        } else {
            let length_code = rans.pop_symbol(&mut self.offset_bits_model, stream)? as u32;
            let mut bits = rans.pop_raw_bits(stream, length_code & 0xF)?;
            if length_code >= 0x10 {
                // Wide distances carry their low 16 bits as a plain
                // stream word, not through the coder state.
                bits = (bits << 16) | u32::from(stream.pop()?);
            }
            let distance = (32 << length_code) + (bits << 5) + dist_sym as u32 - 39;
            self.recent.insert(distance);
            distance
        };

        if distance == 0 || distance as usize > self.index {
            return Err(Error::InvalidMatchDistance {
                distance,
                position: self.index,
            });
        }
        if copy_length > self.output.len() - self.index {
            return Err(Error::OutputOverflow {
                position: self.index,
                length: copy_length,
                capacity: self.output.len(),
            });
        }

        // Byte-by-byte: source and destination overlap when the
        // distance is shorter than the match.
        for _ in 0..copy_length {
            self.output[self.index] = self.output[self.index - distance as usize];
            self.index += 1;
        }
        self.last_offset = distance as usize;
        Ok(())
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Decompress a raw `BitKnit` stream into a caller-provided buffer.
///
/// `output` must be sized to exactly the decompressed length recorded
/// alongside the stream (GR2 section headers carry it). On failure the
/// buffer contents are unspecified; partial writes are not rolled back.
///
/// # Errors
/// Returns an error on truncated input, a bad magic or quantum header,
/// an impossible match distance, a copy past the output end, or a coder
/// state mismatch at a quantum boundary.
pub fn decompress_into(compressed: &[u8], output: &mut [u8]) -> Result<()> {
    if compressed.len() < 2 {
        return Err(Error::InputTooSmall {
            len: compressed.len(),
        });
    }
    if output.is_empty() {
        return Err(Error::EmptyOutput);
    }

    tracing::debug!(
        "BitKnit decompression: {} -> {} bytes",
        compressed.len(),
        output.len()
    );

    let mut stream = WordReader::new(compressed);
    let magic = stream.pop()?;
    if magic != BITKNIT_MAGIC {
        return Err(Error::InvalidMagic { found: magic });
    }

    let mut decoder = BitknitDecoder::new(output);
    while decoder.index < decoder.output.len() {
        decoder.decode_quantum(&mut stream)?;
    }
    Ok(())
}

/// Decompress a raw `BitKnit` stream into a freshly allocated buffer.
///
/// # Errors
/// Returns an error if decompression fails; see [`decompress_into`].
pub fn decompress(compressed: &[u8], decompressed_size: usize) -> Result<Vec<u8>> {
    let mut output = vec![0u8; decompressed_size];
    decompress_into(compressed, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cache_starts_with_unit_distances() {
        for rank in 0..8 {
            let mut cache = RecentDistances::new();
            assert_eq!(cache.hit(rank), 1);
        }
    }

    #[test]
    fn insert_lands_in_the_second_oldest_slot() {
        let mut cache = RecentDistances::new();
        cache.insert(42);
        assert_eq!(cache.entries[6], 42);
        assert_eq!(cache.entries[7], 1);
        // A second insert demotes the first into the oldest slot.
        cache.insert(99);
        assert_eq!(cache.entries[6], 99);
        assert_eq!(cache.entries[7], 42);
        assert_eq!(cache.hit(6), 99);
        // The hit moved that slot to the front.
        assert_eq!(cache.hit(0), 99);
    }

    #[test]
    fn hit_rotates_the_ranking_prefix() {
        let mut cache = RecentDistances::new();
        cache.entries = [10, 11, 12, 13, 14, 15, 16, 17];
        assert_eq!(cache.hit(3), 13);
        // Slot 3 is now ranked first; ranks above the hit are untouched.
        assert_eq!(cache.hit(0), 13);
        assert_eq!((cache.order >> 21) & 7, 7);
        assert_eq!((cache.order >> 18) & 7, 6);
        // The demoted prefix kept its relative order.
        assert_eq!(cache.hit(1), 10);
    }
}
