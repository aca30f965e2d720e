//! Index-range partitioning for independent work items.
//!
//! Per-wavelength and per-direction-pair computations never depend on each
//! other, so a flat index space `[start, end)` can be cut into contiguous
//! ranges and handed to separate workers. Results are reassembled by range
//! order, which keeps the outcome identical to a serial loop.

/// A half-open index range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of indices covered by the range.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Split `[start, end)` into at most `number_of_splits` contiguous ranges.
///
/// Range lengths differ by at most one; the longer ranges come first. No
/// empty range is ever returned, so asking for more splits than there are
/// indices yields one range per index. An empty input yields no ranges.
pub fn chunk_it(start: usize, end: usize, number_of_splits: usize) -> Vec<IndexRange> {
    if end <= start {
        return Vec::new();
    }
    let total = end - start;
    let splits = number_of_splits.clamp(1, total);
    let base = total / splits;
    let remainder = total % splits;

    let mut ranges = Vec::with_capacity(splits);
    let mut cursor = start;
    for i in 0..splits {
        let len = base + usize::from(i < remainder);
        ranges.push(IndexRange::new(cursor, cursor + len));
        cursor += len;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_cover_range_without_gaps() {
        let ranges = chunk_it(3, 20, 4);
        assert_eq!(ranges.len(), 4);
        assert_eq!(ranges[0].start, 3);
        assert_eq!(ranges.last().unwrap().end, 20);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        let total: usize = ranges.iter().map(IndexRange::len).sum();
        assert_eq!(total, 17);
    }

    #[test]
    fn test_chunk_lengths_differ_by_at_most_one() {
        let ranges = chunk_it(0, 10, 3);
        let lens: Vec<usize> = ranges.iter().map(IndexRange::len).collect();
        assert_eq!(lens, vec![4, 3, 3]);
    }

    #[test]
    fn test_more_splits_than_items() {
        let ranges = chunk_it(0, 2, 8);
        assert_eq!(ranges, vec![IndexRange::new(0, 1), IndexRange::new(1, 2)]);
    }

    #[test]
    fn test_empty_input_gives_no_ranges() {
        assert!(chunk_it(5, 5, 4).is_empty());
        assert!(chunk_it(6, 5, 4).is_empty());
    }

    #[test]
    fn test_zero_splits_treated_as_one() {
        assert_eq!(chunk_it(0, 4, 0), vec![IndexRange::new(0, 4)]);
    }
}
