//! Fold regions over log rows.

/// A contiguous, half-open range of hidden log rows `[start, end)`.
///
/// Display sinks anchor the fold indicator at the end of row `start - 1`,
/// so the first visible row after the region is never swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoldRegion {
    /// First hidden row
    pub start: usize,
    /// One past the last hidden row
    pub end: usize,
}

impl FoldRegion {
    /// Create a new region.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Region covering a single row.
    pub fn row(row: usize) -> Self {
        Self::new(row, row + 1)
    }

    /// Whether the region covers no rows.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `row` lies inside the region.
    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }

    /// Smallest region covering both `self` and `other`.
    pub fn cover(&self, other: FoldRegion) -> FoldRegion {
        FoldRegion::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Move the region up after `count` rows were removed from the head.
    ///
    /// Returns `None` when every covered row was removed.
    pub fn shifted_up(&self, count: usize) -> Option<FoldRegion> {
        let region = FoldRegion::new(
            self.start.saturating_sub(count),
            self.end.saturating_sub(count),
        );
        (!region.is_empty()).then_some(region)
    }
}
