//! Splitting a manifest into per-worker chunks.
//!
//! A CI run split across `total_chunks` workers has every worker compute the
//! same partition of the same [`Manifest`](crate::manifest::Manifest), then
//! keep only its own slice. Because partitioning is a pure function of the
//! manifest and the chunk count, workers never need to coordinate.
//!
//! ```text
//!   Manifest ──► EqualTimeChunker::partition(k) ──► Vec<Chunk> (k chunks)
//!                                                        │
//!                          select(&chunks, this_chunk) ◄─┘
//!                                     │
//!                                     ▼
//!                               Chunk (one worker)
//! ```
//!
//! # Example
//!
//! ```
//! use equichunk::chunk::{EqualTimeChunker, select};
//! use equichunk::manifest::{Group, Manifest, TestEntry};
//! use equichunk::weight::WeightModel;
//!
//! let manifest = Manifest::new(vec![
//!     Group::new("a", vec![TestEntry::new("a/test_1")]).unwrap(),
//!     Group::new("b", vec![TestEntry::new("b/test_2")]).unwrap(),
//! ]).unwrap();
//!
//! let chunker = EqualTimeChunker::new(WeightModel::default());
//! let chunks = chunker.partition(&manifest, 2)?;
//! let mine = select(&chunks, 2)?;
//! assert_eq!(mine.groups()[0].key(), "b");
//! # Ok::<(), equichunk::chunk::ChunkError>(())
//! ```

pub mod equal_time;
pub mod select;

pub use equal_time::EqualTimeChunker;
pub use select::{Selection, select};

use crate::manifest::{Group, TestEntry};

/// Result type for chunking operations.
pub type ChunkResult<T> = Result<T, ChunkError>;

/// Errors raised while partitioning or selecting chunks.
///
/// All of these are structural: retrying with the same inputs fails the
/// same way.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChunkError {
    /// A chunk count, chunk index or weight setting is malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The manifest has fewer groups than the requested number of chunks.
    #[error(
        "Cannot split {groups} groups into {total_chunks} chunks: each chunk needs at least one group"
    )]
    InsufficientGroups { total_chunks: usize, groups: usize },

    /// The requested chunk does not exist in the partition.
    #[error("Chunk {this_chunk} is out of range: expected a value between 1 and {total_chunks}")]
    OutOfRange {
        this_chunk: usize,
        total_chunks: usize,
    },
}

/// One worker's share of the manifest: a contiguous run of whole groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk<'a> {
    number: usize,
    weight: f64,
    groups: &'a [Group],
}

impl<'a> Chunk<'a> {
    pub(crate) fn new(number: usize, weight: f64, groups: &'a [Group]) -> Self {
        debug_assert!(!groups.is_empty());
        Self {
            number,
            weight,
            groups,
        }
    }

    /// Returns the 1-based position of this chunk in the partition.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Returns the summed weight of the chunk's groups.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns the chunk's groups in manifest order.
    pub fn groups(&self) -> &'a [Group] {
        self.groups
    }

    /// Returns the number of tests in the chunk.
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.tests().len()).sum()
    }

    /// Iterates over every test in the chunk in manifest order.
    pub fn tests(self) -> impl Iterator<Item = &'a TestEntry> {
        self.groups.iter().flat_map(|g| g.tests().iter())
    }
}
