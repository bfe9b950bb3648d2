//! The chunk listing manifest: ordered entries plus a hash index.

use std::collections::HashMap;

use keel_types::ChunkHash;
use serde::{Deserialize, Serialize};

use crate::error::ListingError;
use crate::wire;

/// A single chunk's place within a backup payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEntry {
    /// Content hash of the chunk plaintext.
    pub hash: ChunkHash,
    /// Byte offset of this chunk within the logical payload.
    pub start: u64,
    /// Size of this chunk in bytes, always positive.
    pub length: u32,
}

/// Ordered manifest of the chunks composing one backup version.
///
/// Entry order is the physical order of chunks in the payload; offsets are
/// derived from that order as a running sum over lengths. A hash index is
/// built once at construction for O(1) membership and entry lookup, and the
/// listing is immutable afterwards, so it is safe to share across threads.
///
/// If the same hash appears more than once in the build input, the first
/// occurrence owns the index mapping; later duplicates keep their physical
/// slot (and correct offset) in the ordered sequence but are not reachable
/// through lookup. The first copy is the one a restore fetches, and every
/// duplicate has identical content by definition of the content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkListing {
    entries: Vec<ChunkEntry>,
    index: HashMap<ChunkHash, usize>,
}

impl ChunkListing {
    /// Build a listing from ordered `(hash, length)` pairs as produced by
    /// the chunker.
    ///
    /// The first entry starts at offset 0; each subsequent entry starts
    /// where the previous one ended. Fails with
    /// [`ListingError::InvalidChunkLength`] if any length is zero.
    pub fn build(
        chunks: impl IntoIterator<Item = (ChunkHash, u32)>,
    ) -> Result<Self, ListingError> {
        let mut entries = Vec::new();
        let mut index = HashMap::new();
        let mut start = 0u64;

        for (position, (hash, length)) in chunks.into_iter().enumerate() {
            if length == 0 {
                return Err(ListingError::InvalidChunkLength { index: position });
            }
            entries.push(ChunkEntry {
                hash,
                start,
                length,
            });
            // First occurrence wins; duplicates keep their ordered slot only.
            index.entry(hash).or_insert(entries.len() - 1);
            start += u64::from(length);
        }

        Ok(Self { entries, index })
    }

    /// Decode a listing from persisted wire bytes.
    ///
    /// Offsets are recomputed from the decoded lengths exactly as in
    /// [`ChunkListing::build`]; the wire format carries none. An empty
    /// input is a valid zero-chunk listing, not an error.
    pub fn read_from_wire(bytes: &[u8]) -> Result<Self, ListingError> {
        Self::build(wire::decode(bytes)?)
    }

    /// Encode the listing as repeated `(hash, length)` records in listing
    /// order. The inverse of [`ChunkListing::read_from_wire`].
    pub fn write_to_wire(&self) -> Vec<u8> {
        wire::encode(&self.entries)
    }

    /// Whether a chunk with the given content hash is present.
    pub fn has_chunk(&self, hash: &ChunkHash) -> bool {
        self.index.contains_key(hash)
    }

    /// Look up the entry for a content hash.
    ///
    /// Absence is a normal outcome (the diff algorithm probes constantly
    /// for missing hashes), so this returns `None` rather than an error.
    pub fn chunk_entry(&self, hash: &ChunkHash) -> Option<&ChunkEntry> {
        self.index.get(hash).map(|&i| &self.entries[i])
    }

    /// Number of chunks in the listing.
    pub fn chunk_count(&self) -> usize {
        self.entries.len()
    }

    /// Total payload size in bytes; 0 for an empty listing.
    pub fn total_size(&self) -> u64 {
        self.entries
            .last()
            .map(|e| e.start + u64::from(e.length))
            .unwrap_or(0)
    }

    /// Iterate entries in listing (payload) order.
    pub fn entries(&self) -> impl Iterator<Item = &ChunkEntry> {
        self.entries.iter()
    }
}
