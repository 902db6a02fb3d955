//! Chunking engine
//!
//! Maps a file's byte length and a target split count to the ordered sizes of its
//! parts. Sizes are derived by ceiling division of the remaining length by the
//! remaining split count; candidates at or below the minimum chunk floor are
//! replaced by `min(remaining, floor)` so small tails are not subdivided further.

use crate::error::{AppError, AppResult};

/// Default number of parts a file is split into.
pub const DEFAULT_SPLIT_COUNT: usize = 5;

/// Default minimum chunk floor (10 KiB).
pub const DEFAULT_MIN_CHUNK_SIZE: u64 = 10 * 1024;

/// Compute the ordered part sizes for a file of `total` bytes.
///
/// The result sums to `total`, contains only positive entries and never has more
/// than `split_count` elements. An empty file yields an empty list.
pub fn calculate_part_sizes(
    total: u64,
    split_count: usize,
    min_chunk_size: u64,
) -> AppResult<Vec<u64>> {
    if split_count == 0 {
        return Err(AppError::InvalidInput(
            "split count must be at least 1".to_string(),
        ));
    }

    let mut sizes = Vec::with_capacity(split_count);
    let mut remaining = total;
    let mut splits_left = split_count as u64;

    while remaining > 0 {
        if splits_left == 0 {
            return Err(AppError::Internal(format!(
                "split counter exhausted with {} of {} bytes unassigned",
                remaining, total
            )));
        }

        let mut part_size = remaining.div_ceil(splits_left);
        if part_size <= min_chunk_size {
            part_size = remaining.min(min_chunk_size);
        }

        sizes.push(part_size);
        remaining -= part_size;
        splits_left -= 1;
    }

    Ok(sizes)
}

/// Split count and chunk floor applied to every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingPolicy {
    split_count: usize,
    min_chunk_size: u64,
}

impl ChunkingPolicy {
    pub fn new(split_count: usize, min_chunk_size: u64) -> AppResult<Self> {
        if split_count == 0 {
            return Err(AppError::InvalidInput(
                "split count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            split_count,
            min_chunk_size,
        })
    }

    pub fn split_count(&self) -> usize {
        self.split_count
    }

    pub fn min_chunk_size(&self) -> u64 {
        self.min_chunk_size
    }

    pub fn part_sizes(&self, total: u64) -> AppResult<Vec<u64>> {
        calculate_part_sizes(total, self.split_count, self.min_chunk_size)
    }
}

impl Default for ChunkingPolicy {
    fn default() -> Self {
        Self {
            split_count: DEFAULT_SPLIT_COUNT,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_clips_small_candidates() {
        let sizes = calculate_part_sizes(23_000, 5, 10_240).unwrap();
        assert_eq!(sizes, vec![10_240, 10_240, 2_520]);
        assert_eq!(sizes.iter().sum::<u64>(), 23_000);
    }

    #[test]
    fn large_file_splits_evenly() {
        let sizes = calculate_part_sizes(1_000_000, 5, 10_240).unwrap();
        assert_eq!(sizes, vec![200_000; 5]);
    }

    #[test]
    fn uneven_split_front_loads_remainder() {
        // ceil(100_003 / 5) = 20_001, then ceil(80_002 / 4) = 20_001, ...
        let sizes = calculate_part_sizes(100_003, 5, 0).unwrap();
        assert_eq!(sizes, vec![20_001, 20_001, 20_001, 20_000, 20_000]);
    }

    #[test]
    fn empty_file_has_no_parts() {
        assert!(calculate_part_sizes(0, 5, 10_240).unwrap().is_empty());
    }

    #[test]
    fn file_below_floor_is_one_part() {
        assert_eq!(calculate_part_sizes(512, 5, 10_240).unwrap(), vec![512]);
    }

    #[test]
    fn zero_split_count_rejected() {
        let err = calculate_part_sizes(10, 0, 1).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(ChunkingPolicy::new(0, 1).is_err());
    }

    #[test]
    fn single_split_takes_everything() {
        assert_eq!(calculate_part_sizes(99_999, 1, 10).unwrap(), vec![99_999]);
    }

    #[test]
    fn sizes_sum_to_total_and_respect_split_count() {
        let floors = [0u64, 1, 7, 1024, 10_240];
        for total in (0u64..2_000).chain([23_000, 65_537, 1 << 20, 10_000_019]) {
            for split_count in 1usize..=8 {
                for floor in floors {
                    let sizes = calculate_part_sizes(total, split_count, floor).unwrap();
                    assert_eq!(sizes.iter().sum::<u64>(), total);
                    assert!(sizes.len() <= split_count);
                    assert!(sizes.iter().all(|&size| size > 0));
                }
            }
        }
    }

    #[test]
    fn default_policy_matches_defaults() {
        let policy = ChunkingPolicy::default();
        assert_eq!(policy.split_count(), 5);
        assert_eq!(policy.min_chunk_size(), 10 * 1024);
        assert_eq!(
            policy.part_sizes(23_000).unwrap(),
            vec![10_240, 10_240, 2_520]
        );
    }
}
