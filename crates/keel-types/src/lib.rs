//! Shared types for the keel backup core.
//!
//! This crate defines [`ChunkHash`], the content-addressed identifier used
//! as the dictionary key throughout the chunk listing and diff engine, and
//! [`HashError`], the error raised when raw bytes cannot form a valid hash.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length in bytes of a chunk content hash.
pub const HASH_LENGTH_BYTES: usize = 32;

/// Content-addressed identifier for a chunk: `blake3(plaintext)`.
///
/// Two hashes are equal iff every digest byte matches; ordering is
/// lexicographic over the digest bytes, so sorted iteration over a set of
/// hashes is deterministic across runs and platforms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChunkHash([u8; HASH_LENGTH_BYTES]);

impl ChunkHash {
    /// Create a hash by digesting chunk plaintext with BLAKE3.
    pub fn from_data(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    /// Return the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH_BYTES] {
        &self.0
    }
}

impl From<[u8; HASH_LENGTH_BYTES]> for ChunkHash {
    fn from(bytes: [u8; HASH_LENGTH_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for ChunkHash {
    type Error = HashError;

    /// Construct from raw digest bytes, e.g. a hash field read off the wire.
    ///
    /// Fails with [`HashError::InvalidLength`] unless the input is exactly
    /// [`HASH_LENGTH_BYTES`] long.
    fn try_from(bytes: &[u8]) -> Result<Self, HashError> {
        let digest: [u8; HASH_LENGTH_BYTES] =
            bytes.try_into().map_err(|_| HashError::InvalidLength {
                expected: HASH_LENGTH_BYTES,
                found: bytes.len(),
            })?;
        Ok(Self(digest))
    }
}

impl AsRef<[u8]> for ChunkHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHash({self})")
    }
}

/// Errors that can occur constructing a [`ChunkHash`].
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The input byte sequence is not a whole digest.
    #[error("invalid hash length: expected {expected} bytes, found {found}")]
    InvalidLength {
        /// Required digest length.
        expected: usize,
        /// Length of the rejected input.
        found: usize,
    },
}
