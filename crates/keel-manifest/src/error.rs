//! Error types for chunk listing operations.

/// Errors that can occur building or decoding a chunk listing.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    /// A chunk in the build input has zero length. A zero-length chunk is
    /// a corrupt chunker result, so construction aborts rather than
    /// producing a partial manifest.
    #[error("chunk at position {index} has zero length")]
    InvalidChunkLength {
        /// Position of the offending chunk in the input sequence.
        index: usize,
    },

    /// Wire bytes do not parse into valid chunk records.
    #[error("malformed chunk listing: {0}")]
    MalformedListing(String),
}
