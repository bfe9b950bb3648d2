//! Chunk listing manifests and diffing for incremental backup.
//!
//! This crate provides:
//! - [`ChunkListing`] — the ordered manifest of content-addressed chunks
//!   composing one backup version, with O(1) hash lookup and a compact
//!   binary wire format.
//! - [`ListingDiff`] — the added/removed/unchanged partition between two
//!   listings, which drives incremental upload and reclamation.
//!
//! A listing is built from the `(hash, length)` pairs an external chunker
//! produces, or decoded from previously persisted wire bytes. Chunk offsets
//! are always derived as a running sum over lengths and never stored, so a
//! decoded listing cannot carry inconsistent offsets.

mod diff;
mod error;
mod listing;
mod wire;

pub use diff::ListingDiff;
pub use error::ListingError;
pub use listing::{ChunkEntry, ChunkListing};
