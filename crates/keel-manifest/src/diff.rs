//! Set reconciliation between two chunk listings.

use std::collections::HashSet;

use keel_types::ChunkHash;

use crate::listing::ChunkListing;

/// Partition of chunk hashes between an old and a new listing.
///
/// - `unchanged`: present in both; their blobs need no re-upload.
/// - `added`: present only in the new listing; the caller must encrypt and
///   upload these blobs.
/// - `removed`: present only in the old listing; candidates for
///   reclamation once no other backup version references them (reference
///   counting is the store's concern, not this crate's).
///
/// Only membership is deterministic; iteration order of the sets is not.
/// Callers that need a stable order use the `sorted_*` accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDiff {
    /// Hashes present in both listings.
    pub unchanged: HashSet<ChunkHash>,
    /// Hashes present only in the new listing.
    pub added: HashSet<ChunkHash>,
    /// Hashes present only in the old listing.
    pub removed: HashSet<ChunkHash>,
}

impl ListingDiff {
    /// Compare two listings in O(n + m) over their hash indices.
    ///
    /// Comparing a listing against itself yields empty `added` and
    /// `removed` sets; an empty `old` makes everything `added`, an empty
    /// `new` makes everything `removed`.
    pub fn compute(old: &ChunkListing, new: &ChunkListing) -> Self {
        let mut unchanged = HashSet::new();
        let mut added = HashSet::new();

        for entry in new.entries() {
            if old.has_chunk(&entry.hash) {
                unchanged.insert(entry.hash);
            } else {
                added.insert(entry.hash);
            }
        }

        let removed = old
            .entries()
            .filter(|entry| !new.has_chunk(&entry.hash))
            .map(|entry| entry.hash)
            .collect();

        Self {
            unchanged,
            added,
            removed,
        }
    }

    /// Whether the two listings contained exactly the same chunk set.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Added hashes in lexicographic digest order.
    pub fn sorted_added(&self) -> Vec<ChunkHash> {
        sorted(&self.added)
    }

    /// Removed hashes in lexicographic digest order.
    pub fn sorted_removed(&self) -> Vec<ChunkHash> {
        sorted(&self.removed)
    }

    /// Unchanged hashes in lexicographic digest order.
    pub fn sorted_unchanged(&self) -> Vec<ChunkHash> {
        sorted(&self.unchanged)
    }
}

fn sorted(set: &HashSet<ChunkHash>) -> Vec<ChunkHash> {
    let mut hashes: Vec<ChunkHash> = set.iter().copied().collect();
    hashes.sort_unstable();
    hashes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(name: &str) -> ChunkHash {
        ChunkHash::from_data(name.as_bytes())
    }

    fn listing(names: &[&str]) -> ChunkListing {
        ChunkListing::build(names.iter().map(|n| (hash(n), 64))).unwrap()
    }

    fn set(names: &[&str]) -> HashSet<ChunkHash> {
        names.iter().map(|n| hash(n)).collect()
    }

    #[test]
    fn test_diff_against_self_is_all_unchanged() {
        let l = listing(&["a", "b", "c"]);
        let diff = ListingDiff::compute(&l, &l);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.unchanged, set(&["a", "b", "c"]));
        assert!(diff.is_unchanged());
    }

    #[test]
    fn test_diff_is_idempotent() {
        let l = listing(&["a", "b"]);
        assert_eq!(
            ListingDiff::compute(&l, &l),
            ListingDiff::compute(&l, &l)
        );
    }

    #[test]
    fn test_empty_old_everything_added() {
        let old = listing(&[]);
        let new = listing(&["a", "b"]);
        let diff = ListingDiff::compute(&old, &new);
        assert_eq!(diff.added, set(&["a", "b"]));
        assert!(diff.removed.is_empty());
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn test_empty_new_everything_removed() {
        let old = listing(&["a", "b"]);
        let new = listing(&[]);
        let diff = ListingDiff::compute(&old, &new);
        assert_eq!(diff.removed, set(&["a", "b"]));
        assert!(diff.added.is_empty());
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn test_disjoint_listings_share_nothing() {
        let old = listing(&["a", "b"]);
        let new = listing(&["c", "d"]);
        let diff = ListingDiff::compute(&old, &new);
        assert!(diff.unchanged.is_empty());
        assert_eq!(diff.added, set(&["c", "d"]));
        assert_eq!(diff.removed, set(&["a", "b"]));
        assert!(!diff.is_unchanged());
    }

    #[test]
    fn test_partial_overlap() {
        let old = listing(&["a", "b", "c"]);
        let new = listing(&["b", "c", "d"]);
        let diff = ListingDiff::compute(&old, &new);
        assert_eq!(diff.unchanged, set(&["b", "c"]));
        assert_eq!(diff.added, set(&["d"]));
        assert_eq!(diff.removed, set(&["a"]));
    }

    #[test]
    fn test_sorted_accessors_are_lexicographic() {
        let old = listing(&[]);
        let new = listing(&["a", "b", "c", "d"]);
        let diff = ListingDiff::compute(&old, &new);

        let added = diff.sorted_added();
        assert_eq!(added.len(), 4);
        for pair in added.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_diff_ignores_lengths_and_offsets() {
        // Same hashes at different positions/lengths still count as unchanged:
        // identity is content, not placement.
        let old = ChunkListing::build([(hash("a"), 10), (hash("b"), 20)]).unwrap();
        let new = ChunkListing::build([(hash("b"), 20), (hash("a"), 10)]).unwrap();
        let diff = ListingDiff::compute(&old, &new);
        assert!(diff.is_unchanged());
        assert_eq!(diff.unchanged, set(&["a", "b"]));
    }
}
