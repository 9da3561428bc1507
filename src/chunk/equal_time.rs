//! Equal-time chunking.
//!
//! Splits a manifest into a fixed number of chunks of roughly equal
//! estimated run time without ever splitting a group.
//!
//! # Algorithm
//!
//! The target share is `total_weight / total_chunks`. Groups are scanned once,
//! left to right, into an open chunk:
//!
//! 1. After a group is added, the open chunk is sealed when its weight has
//!    reached the target *and* enough groups remain to give every later
//!    chunk at least one.
//! 2. If the groups left over exactly cover the later chunks, the open chunk
//!    is sealed regardless of weight.
//! 3. Once the unassigned groups exactly match the unfilled chunks, each of
//!    them becomes its own chunk.
//! 4. The last chunk absorbs whatever groups remain.
//!
//! Weight balancing always yields to feasibility, so a manifest with exactly
//! `total_chunks` groups is split one group per chunk however skewed the
//! weights are.

use tracing::debug;

use super::{Chunk, ChunkError, ChunkResult};
use crate::manifest::Manifest;
use crate::weight::WeightModel;

/// Relative slack when deciding whether a chunk has reached its share.
const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Partitions manifests into equal-time chunks.
///
/// The chunker holds no state between calls: the same manifest and chunk
/// count always produce the same partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualTimeChunker {
    weights: WeightModel,
}

impl EqualTimeChunker {
    /// Creates a chunker that weighs tests with the given model.
    pub fn new(weights: WeightModel) -> Self {
        Self { weights }
    }

    /// Splits `manifest` into exactly `total_chunks` non-empty chunks.
    ///
    /// Concatenating the returned chunks in order reproduces the manifest.
    ///
    /// # Errors
    ///
    /// - [`ChunkError::InvalidArgument`] if `total_chunks` is zero.
    /// - [`ChunkError::InsufficientGroups`] if the manifest has fewer groups
    ///   than `total_chunks`.
    pub fn partition<'a>(
        &self,
        manifest: &'a Manifest,
        total_chunks: usize,
    ) -> ChunkResult<Vec<Chunk<'a>>> {
        if total_chunks < 1 {
            return Err(ChunkError::InvalidArgument(format!(
                "total chunks must be at least 1, got {total_chunks}"
            )));
        }

        let groups = manifest.groups();
        if groups.len() < total_chunks {
            return Err(ChunkError::InsufficientGroups {
                total_chunks,
                groups: groups.len(),
            });
        }

        let weights: Vec<f64> = groups
            .iter()
            .map(|g| self.weights.group_weight(g))
            .collect();
        let total_weight: f64 = weights.iter().sum();
        let target = total_weight / total_chunks as f64;
        // Compare `open * k` against the total rather than `open` against the
        // rounded target, and allow float noise in the summed weights.
        let reached_target =
            |open: f64| open * total_chunks as f64 >= total_weight * (1.0 - WEIGHT_TOLERANCE);

        debug!(
            "Partitioning {} groups into {} chunks (total weight {}, target {})",
            groups.len(),
            total_chunks,
            total_weight,
            target
        );

        let mut chunks: Vec<Chunk<'a>> = Vec::with_capacity(total_chunks);
        // The open chunk spans groups[start..next].
        let mut start = 0;
        let mut next = 0;
        let mut open_weight = 0.0;

        while next < groups.len() {
            let unfilled = total_chunks - chunks.len();

            if start == next && groups.len() - next == unfilled {
                debug!(
                    "Assigning the remaining {} groups one per chunk",
                    groups.len() - next
                );
                for (i, weight) in weights.iter().enumerate().skip(next) {
                    chunks.push(Chunk::new(chunks.len() + 1, *weight, &groups[i..=i]));
                }
                start = groups.len();
                break;
            }

            open_weight += weights[next];
            next += 1;

            // The last chunk takes everything that is left.
            let later_chunks = unfilled - 1;
            if later_chunks == 0 {
                continue;
            }

            let unassigned = groups.len() - next;
            let forced = unassigned == later_chunks;
            let balanced = reached_target(open_weight) && unassigned >= later_chunks;

            if forced || balanced {
                let chunk = Chunk::new(chunks.len() + 1, open_weight, &groups[start..next]);
                debug!(
                    "Sealed chunk {} with {} groups (weight {})",
                    chunk.number(),
                    chunk.groups().len(),
                    chunk.weight()
                );
                chunks.push(chunk);
                start = next;
                open_weight = 0.0;
            }
        }

        if start < groups.len() {
            chunks.push(Chunk::new(chunks.len() + 1, open_weight, &groups[start..]));
        }

        debug_assert_eq!(chunks.len(), total_chunks);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Group, TestEntry};

    /// Builds a manifest where each group holds `count` unit-weight tests.
    fn manifest(groups: &[(&str, usize)]) -> Manifest {
        let groups = groups
            .iter()
            .map(|(key, count)| {
                let tests = (0..*count)
                    .map(|i| TestEntry::new(format!("{key}/test_{i}")))
                    .collect();
                Group::new(*key, tests).unwrap()
            })
            .collect();
        Manifest::new(groups).unwrap()
    }

    fn keys(chunks: &[Chunk<'_>]) -> Vec<Vec<String>> {
        chunks
            .iter()
            .map(|c| c.groups().iter().map(|g| g.key().to_string()).collect())
            .collect()
    }

    fn partition(manifest: &Manifest, total_chunks: usize) -> ChunkResult<Vec<Chunk<'_>>> {
        EqualTimeChunker::default().partition(manifest, total_chunks)
    }

    fn assert_covers(manifest: &Manifest, chunks: &[Chunk<'_>]) {
        let flattened: Vec<&Group> = chunks.iter().flat_map(|c| c.groups().iter()).collect();
        let expected: Vec<&Group> = manifest.groups().iter().collect();
        assert_eq!(flattened, expected);
        assert!(chunks.iter().all(|c| !c.groups().is_empty()));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.number(), i + 1);
        }
    }

    #[test]
    fn test_equal_groups_one_per_chunk() {
        let m = manifest(&[("a", 10), ("a/b", 10), ("c", 10)]);
        let chunks = partition(&m, 3).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a"], vec!["a/b"], vec!["c"]]);
    }

    #[test]
    fn test_small_groups_merge_to_target() {
        let m = manifest(&[("a", 5), ("a/b", 5), ("c", 10), ("d", 10)]);
        let chunks = partition(&m, 3).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a", "a/b"], vec!["c"], vec!["d"]]);
        let weights: Vec<f64> = chunks.iter().map(|c| c.weight()).collect();
        assert_eq!(weights, vec![10.0, 10.0, 10.0]);
    }

    #[test]
    fn test_heavy_first_group_forced_one_to_one() {
        let m = manifest(&[("a", 100), ("a/b", 1), ("c", 1)]);
        let chunks = partition(&m, 3).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a"], vec!["a/b"], vec!["c"]]);
    }

    #[test]
    fn test_heavy_middle_group_forced_one_to_one() {
        let m = manifest(&[("a", 1), ("a/b", 100), ("c", 1)]);
        let chunks = partition(&m, 3).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a"], vec!["a/b"], vec!["c"]]);
    }

    #[test]
    fn test_more_chunks_than_groups() {
        let m = manifest(&[("a", 1), ("a/b", 100), ("c", 1)]);
        let err = partition(&m, 4).unwrap_err();
        assert_eq!(
            err,
            ChunkError::InsufficientGroups {
                total_chunks: 4,
                groups: 3
            }
        );
        assert!(err.to_string().contains("3 groups"));
        assert!(err.to_string().contains("4 chunks"));
    }

    #[test]
    fn test_zero_chunks_is_invalid() {
        let m = manifest(&[("a", 1)]);
        assert!(matches!(
            partition(&m, 0),
            Err(ChunkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_chunks_checked_before_group_count() {
        let m = Manifest::default();
        assert!(matches!(
            partition(&m, 0),
            Err(ChunkError::InvalidArgument(_))
        ));
        assert!(matches!(
            partition(&m, 1),
            Err(ChunkError::InsufficientGroups { groups: 0, .. })
        ));
    }

    #[test]
    fn test_single_chunk_takes_everything() {
        let m = manifest(&[("a", 3), ("b", 7), ("c", 2)]);
        let chunks = partition(&m, 1).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a", "b", "c"]]);
        assert_eq!(chunks[0].weight(), 12.0);
        assert_eq!(chunks[0].test_count(), 12);
    }

    #[test]
    fn test_last_chunk_absorbs_remainder() {
        // Target is 4: "a" seals alone, then "b" + "c" reach 4 and seal,
        // leaving the tail for the last chunk.
        let m = manifest(&[("a", 4), ("b", 2), ("c", 2), ("d", 1), ("e", 1), ("f", 2)]);
        let chunks = partition(&m, 3).unwrap();
        assert_eq!(
            keys(&chunks),
            vec![vec!["a"], vec!["b", "c"], vec!["d", "e", "f"]]
        );
        assert_covers(&m, &chunks);
    }

    #[test]
    fn test_feasibility_overrides_weight() {
        // Target is 4, but "a" + "b" are sealed at weight 2 so that "c" and
        // "d" still get chunks of their own.
        let m = manifest(&[("a", 1), ("b", 1), ("c", 5), ("d", 5)]);
        let chunks = partition(&m, 3).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a", "b"], vec!["c"], vec!["d"]]);

        let m = manifest(&[("a", 1), ("b", 1), ("c", 1), ("d", 9)]);
        let chunks = partition(&m, 2).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a", "b", "c"], vec!["d"]]);
    }

    #[test]
    fn test_heavy_head_keeps_feasibility() {
        // "a" alone exceeds the target of 18. The light tail never reaches
        // it, so the second chunk is sealed only when "e" is the last group
        // left for the last chunk.
        let m = manifest(&[("a", 50), ("b", 1), ("c", 1), ("d", 1), ("e", 1)]);
        let chunks = partition(&m, 3).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a"], vec!["b", "c", "d"], vec!["e"]]);
    }

    #[test]
    fn test_declared_timeouts_drive_balance() {
        let m = Manifest::new(vec![
            Group::new("a", vec![TestEntry::new("a/1").with_timeout(60.0)]).unwrap(),
            Group::new("b", vec![TestEntry::new("b/1").with_timeout(20.0)]).unwrap(),
            Group::new("c", vec![TestEntry::new("c/1").with_timeout(20.0)]).unwrap(),
            Group::new("d", vec![TestEntry::new("d/1").with_timeout(20.0)]).unwrap(),
        ])
        .unwrap();
        let chunks = partition(&m, 2).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a"], vec!["b", "c", "d"]]);
        assert_eq!(chunks[0].weight(), 60.0);
        assert_eq!(chunks[1].weight(), 60.0);
    }

    #[test]
    fn test_fractional_timeouts_reach_target() {
        // 0.3 + 0.1 + 0.2 sums to 0.6000000000000001, so the halved target
        // rounds above 0.3; "a" must still count as a full share.
        let m = Manifest::new(vec![
            Group::new("a", vec![TestEntry::new("a/1").with_timeout(0.3)]).unwrap(),
            Group::new("b", vec![TestEntry::new("b/1").with_timeout(0.1)]).unwrap(),
            Group::new("c", vec![TestEntry::new("c/1").with_timeout(0.2)]).unwrap(),
        ])
        .unwrap();
        let chunks = partition(&m, 2).unwrap();
        assert_eq!(keys(&chunks), vec![vec!["a"], vec!["b", "c"]]);
        assert!((chunks[0].weight() - 0.3).abs() < 1e-12);
        assert!((chunks[1].weight() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_partition_properties() {
        // Deterministic pseudo-random group sizes.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut sizes = Vec::new();
        for _ in 0..40 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            sizes.push((seed % 20 + 1) as usize);
        }
        let names: Vec<String> = (0..sizes.len()).map(|i| format!("dir{i}")).collect();
        let layout: Vec<(&str, usize)> = names
            .iter()
            .map(String::as_str)
            .zip(sizes.iter().copied())
            .collect();

        for n in [1, 2, 5, 13, 40] {
            let m = manifest(&layout[..n]);
            for k in 1..=n {
                let chunks = partition(&m, k).unwrap();
                assert_eq!(chunks.len(), k, "n={n} k={k}");
                assert_covers(&m, &chunks);
                if k == n {
                    assert!(chunks.iter().all(|c| c.groups().len() == 1));
                }

                let total: f64 = chunks.iter().map(|c| c.weight()).sum();
                assert_eq!(total as usize, m.test_count());
            }
            assert!(matches!(
                partition(&m, n + 1),
                Err(ChunkError::InsufficientGroups { .. })
            ));
        }
    }

    #[test]
    fn test_partition_is_deterministic() {
        let m = manifest(&[("a", 3), ("b", 9), ("c", 1), ("d", 4), ("e", 6), ("f", 2)]);
        let first = partition(&m, 3).unwrap();
        for _ in 0..10 {
            assert_eq!(partition(&m, 3).unwrap(), first);
        }
    }
}
