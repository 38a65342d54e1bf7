//! Chunk deduplication by content id

use gleaner_domain::Chunk;
use std::collections::HashSet;

/// Drop chunks whose id was already seen, keeping the first occurrence
///
/// Order of the retained chunks is preserved. Applying this twice gives the
/// same result as applying it once.
pub fn deduplicate_chunks(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut seen = HashSet::with_capacity(chunks.len());
    chunks.into_iter().filter(|chunk| seen.insert(chunk.id)).collect()
}
