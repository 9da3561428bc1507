//! equichunk: split a test manifest into equal-time CI chunks.
//!
//! Given an ordered manifest of tests grouped by directory, this crate
//! assigns the groups to a fixed number of parallel CI workers so that each
//! worker runs roughly the same estimated time, without ever splitting a
//! group across two workers.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Manifest**: The ordered, directory-grouped test list ([`manifest`])
//! - **Weight Model**: Per-test and per-group cost estimates ([`weight`])
//! - **Chunker**: The equal-time partitioner and chunk selector ([`chunk`])
//! - **Report**: Text and JSON rendering of chunks ([`report`])
//!
//! # Example
//!
//! ```
//! use equichunk::{EqualTimeChunker, Manifest, Selection, TestEntry, WeightModel};
//!
//! let manifest = Manifest::from_tests(vec![
//!     TestEntry::new("dom/test_a.html"),
//!     TestEntry::new("dom/test_b.html"),
//!     TestEntry::new("layout/test_c.html").with_timeout(2.0),
//! ])?;
//!
//! let chunker = EqualTimeChunker::new(WeightModel::default());
//! let chunk = Selection::new(2, 2)?.apply(&chunker, &manifest)?;
//! assert_eq!(chunk.groups()[0].key(), "layout");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chunk;
pub mod config;
pub mod manifest;
pub mod report;
pub mod weight;

// Re-export commonly used types
pub use chunk::{Chunk, ChunkError, ChunkResult, EqualTimeChunker, Selection, select};
pub use config::{Config, load_config};
pub use manifest::{Group, Manifest, ManifestError, TestEntry};
pub use weight::WeightModel;
