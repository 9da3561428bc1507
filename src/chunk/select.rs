//! Picking one worker's chunk out of a partition.
//!
//! Chunk indices are 1-based, matching the "shard N of M" convention CI
//! systems use.

use tracing::info;

use super::{Chunk, ChunkError, ChunkResult, EqualTimeChunker};
use crate::manifest::Manifest;

/// Returns chunk `this_chunk` (1-based) from `chunks`.
///
/// # Errors
///
/// Returns [`ChunkError::OutOfRange`] if `this_chunk` is not within
/// `1..=chunks.len()`.
pub fn select<'a>(chunks: &[Chunk<'a>], this_chunk: usize) -> ChunkResult<Chunk<'a>> {
    this_chunk
        .checked_sub(1)
        .and_then(|i| chunks.get(i))
        .copied()
        .ok_or(ChunkError::OutOfRange {
            this_chunk,
            total_chunks: chunks.len(),
        })
}

/// A validated request for one worker's chunk.
///
/// ```
/// use equichunk::chunk::Selection;
///
/// let selection = Selection::new(4, 2).unwrap();
/// assert_eq!(selection.this_chunk(), 2);
/// assert!(Selection::new(4, 5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    total_chunks: usize,
    this_chunk: usize,
}

impl Selection {
    /// Validates `total_chunks >= 1` and `1 <= this_chunk <= total_chunks`.
    pub fn new(total_chunks: usize, this_chunk: usize) -> ChunkResult<Self> {
        if total_chunks < 1 {
            return Err(ChunkError::InvalidArgument(format!(
                "total chunks must be at least 1, got {total_chunks}"
            )));
        }
        if !(1..=total_chunks).contains(&this_chunk) {
            return Err(ChunkError::InvalidArgument(format!(
                "this chunk {this_chunk} must be a number between 1 and total chunks {total_chunks}, inclusive"
            )));
        }
        Ok(Self {
            total_chunks,
            this_chunk,
        })
    }

    /// Returns the number of chunks the manifest is split into.
    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    /// Returns the 1-based index of the chunk to run.
    pub fn this_chunk(&self) -> usize {
        self.this_chunk
    }

    /// Computes the full partition of `manifest` and returns this worker's chunk.
    pub fn apply<'a>(
        &self,
        chunker: &EqualTimeChunker,
        manifest: &'a Manifest,
    ) -> ChunkResult<Chunk<'a>> {
        let chunks = chunker.partition(manifest, self.total_chunks)?;
        let chunk = select(&chunks, self.this_chunk)?;
        info!(
            "Selected chunk {}/{}: {} groups, {} tests (weight {})",
            chunk.number(),
            self.total_chunks,
            chunk.groups().len(),
            chunk.test_count(),
            chunk.weight()
        );
        Ok(chunk)
    }
}
