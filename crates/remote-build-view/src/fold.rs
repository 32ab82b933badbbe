//! Filter-driven fold-state engine.
//!
//! Lines the filter rejects are hidden in contiguous fold regions. At most one
//! region is open at a time: a hidden line extends it (or opens one), a
//! visible line closes it. The same merge rule drives both incremental
//! classification and the full re-filter pass, so both derive identical
//! region sets.

use remote_build_core::{FoldRegion, LogFilter};

/// Display change produced by classifying one appended line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldUpdate {
    /// The line is visible; nothing to fold.
    Visible,
    /// The line is hidden. Replace `previous` (if any) with `region`.
    Fold {
        /// Extent of the open region before this line
        previous: Option<FoldRegion>,
        /// Extent after growing over this line
        region: FoldRegion,
    },
}

/// Tracks the open (extendable) fold region.
#[derive(Debug, Clone, Default)]
pub struct FoldEngine {
    open: Option<FoldRegion>,
}

impl FoldEngine {
    /// Create an engine with no open region.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently open region.
    pub fn open_region(&self) -> Option<FoldRegion> {
        self.open
    }

    /// Classify a newly appended line at `row`.
    pub fn classify(&mut self, filter: &LogFilter, row: usize, line: &str) -> FoldUpdate {
        if filter.is_visible(line) {
            self.open = None;
            return FoldUpdate::Visible;
        }

        let previous = self.open;
        let region = match previous {
            Some(open) => open.cover(FoldRegion::row(row)),
            None => FoldRegion::row(row),
        };
        self.open = Some(region);
        FoldUpdate::Fold { previous, region }
    }

    /// Re-derive every hidden region from scratch.
    ///
    /// Leaves the trailing region open when it reaches the last row.
    pub fn reapply<'a>(
        &mut self,
        filter: &LogFilter,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Vec<FoldRegion> {
        let mut regions = Vec::new();
        let mut current: Option<FoldRegion> = None;

        for (row, line) in lines.into_iter().enumerate() {
            if filter.is_visible(line) {
                if let Some(region) = current.take() {
                    regions.push(region);
                }
            } else {
                current = Some(match current {
                    Some(region) => region.cover(FoldRegion::row(row)),
                    None => FoldRegion::row(row),
                });
            }
        }

        if let Some(region) = current {
            regions.push(region);
        }
        self.open = current;
        regions
    }

    /// Account for `count` rows removed from the head of the document.
    pub fn rows_evicted(&mut self, count: usize) {
        self.open = self.open.and_then(|region| region.shifted_up(count));
    }

    /// Forget the open region.
    pub fn reset(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pattern: &str) -> LogFilter {
        LogFilter::new(pattern).unwrap()
    }

    #[test]
    fn test_visible_line_closes_region() {
        let mut engine = FoldEngine::new();
        let f = filter("match");
        engine.classify(&f, 0, "A");
        assert!(engine.open_region().is_some());
        assert_eq!(engine.classify(&f, 1, "B match"), FoldUpdate::Visible);
        assert_eq!(engine.open_region(), None);
    }

    #[test]
    fn test_hidden_lines_grow_one_region() {
        let mut engine = FoldEngine::new();
        let f = filter("match");
        assert_eq!(
            engine.classify(&f, 0, "C"),
            FoldUpdate::Fold {
                previous: None,
                region: FoldRegion::row(0)
            }
        );
        assert_eq!(
            engine.classify(&f, 1, "D"),
            FoldUpdate::Fold {
                previous: Some(FoldRegion::row(0)),
                region: FoldRegion::new(0, 2)
            }
        );
    }

    #[test]
    fn test_reapply_scenario() {
        let mut engine = FoldEngine::new();
        let regions = engine.reapply(&filter("match"), ["A", "B match", "C", "D"]);
        assert_eq!(regions, vec![FoldRegion::row(0), FoldRegion::new(2, 4)]);
        assert_eq!(engine.open_region(), Some(FoldRegion::new(2, 4)));
    }

    #[test]
    fn test_reapply_closed_tail() {
        let mut engine = FoldEngine::new();
        let regions = engine.reapply(&filter("ok"), ["x", "ok"]);
        assert_eq!(regions, vec![FoldRegion::row(0)]);
        assert_eq!(engine.open_region(), None);
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let lines = ["a", "keep", "b", "c", "keep", "d"];
        let f = filter("keep");
        let mut engine = FoldEngine::new();
        let first = engine.reapply(&f, lines);
        let second = engine.reapply(&f, lines);
        assert_eq!(first, second);
    }

    #[test]
    fn test_eviction_shifts_open_region() {
        let mut engine = FoldEngine::new();
        let f = filter("keep");
        engine.classify(&f, 0, "a");
        engine.classify(&f, 1, "b");
        engine.rows_evicted(1);
        assert_eq!(engine.open_region(), Some(FoldRegion::row(0)));
        engine.rows_evicted(1);
        assert_eq!(engine.open_region(), None);
    }
}
