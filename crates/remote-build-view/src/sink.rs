//! Display sink interface and an in-memory implementation.
//!
//! The render loop owns its sink exclusively and is the only caller. Rows are
//! whole log lines; fold regions are half-open row ranges.

use std::collections::VecDeque;
use std::ops::Range;

use remote_build_core::{Error, FoldRegion, Result};

/// Scope name reported by this tool's own output view.
pub const REMOTE_BUILD_SCOPE: &str = "source.remotebuild";

/// Whether `scope` belongs to a Remote Build output view.
pub fn is_remote_build_scope(scope: &str) -> bool {
    scope.starts_with(REMOTE_BUILD_SCOPE)
}

/// Viewport position in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportPosition {
    /// Horizontal offset
    pub x: f64,
    /// Vertical offset
    pub y: f64,
}

impl ViewportPosition {
    /// Create a new viewport position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The rendering surface the render loop writes into.
pub trait DisplaySink {
    /// Append one line at the end.
    fn append_line(&mut self, line: &str) -> Result<()>;

    /// Erase a range of rows.
    fn erase_rows(&mut self, rows: Range<usize>) -> Result<()>;

    /// Toggle whether the surface accepts edits.
    fn set_read_only(&mut self, read_only: bool);

    /// Fold a set of regions in one operation.
    fn fold(&mut self, regions: &[FoldRegion]) -> Result<()>;

    /// Remove the fold covering exactly `region`.
    ///
    /// Larger folds that merely contain it, such as one created by fold-all,
    /// stay in place.
    fn unfold(&mut self, region: FoldRegion) -> Result<()>;

    /// Remove every fold.
    fn unfold_all(&mut self) -> Result<()>;

    /// Collapse everything the surface knows how to fold.
    fn fold_all(&mut self) -> Result<()>;

    /// Move the cursor to a row and bring it into view.
    fn scroll_to_line(&mut self, row: usize) -> Result<()>;

    /// Set the viewport position directly.
    fn set_viewport_position(&mut self, position: ViewportPosition) -> Result<()>;

    /// Bring the end of the document into view.
    fn show_end(&mut self) -> Result<()>;

    /// Total text size in bytes.
    fn size(&self) -> usize;

    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Scope name at the current selection, if the surface has one.
    fn scope_at_selection(&self) -> Option<String>;
}

/// In-memory display sink.
///
/// Holds the text and fold set exactly as an editor view would, which makes
/// it the reference surface for tests and the backing store for the console
/// front end.
#[derive(Debug, Clone)]
pub struct BufferSink {
    lines: VecDeque<String>,
    folds: Vec<FoldRegion>,
    read_only: bool,
    cursor_row: Option<usize>,
    viewport: ViewportPosition,
    end_shown: usize,
}

impl BufferSink {
    /// Create an empty, read-only sink.
    pub fn new() -> Self {
        Self {
            lines: VecDeque::new(),
            folds: Vec::new(),
            read_only: true,
            cursor_row: None,
            viewport: ViewportPosition::default(),
            end_shown: 0,
        }
    }

    /// All lines, oldest first.
    pub fn lines(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }

    /// Text of a row.
    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    /// Current folds, ordered by start row.
    pub fn folds(&self) -> &[FoldRegion] {
        &self.folds
    }

    /// Whether `row` is inside a fold.
    pub fn is_hidden(&self, row: usize) -> bool {
        self.folds.iter().any(|fold| fold.contains(row))
    }

    /// Lines outside every fold.
    pub fn visible_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(row, _)| !self.is_hidden(*row))
            .map(|(_, line)| line.as_str())
            .collect()
    }

    /// Whether the surface currently rejects edits.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Row the cursor was last moved to.
    pub fn cursor_row(&self) -> Option<usize> {
        self.cursor_row
    }

    /// Current viewport position.
    pub fn viewport(&self) -> ViewportPosition {
        self.viewport
    }

    /// How many times the end of the document was brought into view.
    pub fn end_shown_count(&self) -> usize {
        self.end_shown
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(Error::Display("view is read-only".to_string()));
        }
        Ok(())
    }

    fn insert_fold(&mut self, region: FoldRegion) {
        if region.is_empty() {
            return;
        }
        let mut merged = region;
        self.folds.retain(|fold| {
            let overlaps = fold.start < merged.end && merged.start < fold.end;
            if overlaps {
                merged = merged.cover(*fold);
            }
            !overlaps
        });
        let pos = self
            .folds
            .iter()
            .position(|fold| fold.start > merged.start)
            .unwrap_or(self.folds.len());
        self.folds.insert(pos, merged);
    }
}

impl Default for BufferSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for BufferSink {
    fn append_line(&mut self, line: &str) -> Result<()> {
        self.check_writable()?;
        self.lines.push_back(line.to_string());
        Ok(())
    }

    fn erase_rows(&mut self, rows: Range<usize>) -> Result<()> {
        self.check_writable()?;
        let end = rows.end.min(self.lines.len());
        let start = rows.start.min(end);
        let removed = end - start;
        if removed == 0 {
            return Ok(());
        }
        self.lines.drain(start..end);

        let remap = |row: usize| {
            if row < start {
                row
            } else if row >= end {
                row - removed
            } else {
                start
            }
        };
        self.folds = self
            .folds
            .iter()
            .map(|fold| FoldRegion::new(remap(fold.start), remap(fold.end)))
            .filter(|fold| !fold.is_empty())
            .collect();
        Ok(())
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn fold(&mut self, regions: &[FoldRegion]) -> Result<()> {
        let rows = self.lines.len();
        if let Some(bad) = regions.iter().find(|region| region.end > rows) {
            return Err(Error::Display(format!(
                "fold {}..{} is outside the document ({} rows)",
                bad.start, bad.end, rows
            )));
        }
        for region in regions {
            self.insert_fold(*region);
        }
        Ok(())
    }

    fn unfold(&mut self, region: FoldRegion) -> Result<()> {
        self.folds.retain(|fold| *fold != region);
        Ok(())
    }

    fn unfold_all(&mut self) -> Result<()> {
        self.folds.clear();
        Ok(())
    }

    fn fold_all(&mut self) -> Result<()> {
        self.folds.clear();
        if !self.lines.is_empty() {
            self.folds.push(FoldRegion::new(0, self.lines.len()));
        }
        Ok(())
    }

    fn scroll_to_line(&mut self, row: usize) -> Result<()> {
        self.cursor_row = Some(row.min(self.lines.len().saturating_sub(1)));
        Ok(())
    }

    fn set_viewport_position(&mut self, position: ViewportPosition) -> Result<()> {
        self.viewport = position;
        Ok(())
    }

    fn show_end(&mut self) -> Result<()> {
        self.end_shown += 1;
        Ok(())
    }

    fn size(&self) -> usize {
        self.lines.iter().map(|line| line.len() + 1).sum()
    }

    fn row_count(&self) -> usize {
        self.lines.len()
    }

    fn scope_at_selection(&self) -> Option<String> {
        Some(REMOTE_BUILD_SCOPE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink_with(lines: &[&str]) -> BufferSink {
        let mut sink = BufferSink::new();
        sink.set_read_only(false);
        for line in lines {
            sink.append_line(line).unwrap();
        }
        sink.set_read_only(true);
        sink
    }

    #[test]
    fn test_read_only_rejects_edits() {
        let mut sink = BufferSink::new();
        assert!(sink.is_read_only());
        assert!(matches!(sink.append_line("x"), Err(Error::Display(_))));
    }

    #[test]
    fn test_size_and_rows() {
        let sink = sink_with(&["ab", "c"]);
        assert_eq!(sink.row_count(), 2);
        assert_eq!(sink.size(), 5);
    }

    #[test]
    fn test_fold_hides_rows() {
        let mut sink = sink_with(&["a", "b", "c", "d"]);
        sink.fold(&[FoldRegion::row(0), FoldRegion::new(2, 4)]).unwrap();
        assert_eq!(sink.visible_lines(), vec!["b"]);
        assert_eq!(sink.folds().len(), 2);
    }

    #[test]
    fn test_fold_outside_document_fails() {
        let mut sink = sink_with(&["a"]);
        assert!(sink.fold(&[FoldRegion::new(0, 2)]).is_err());
    }

    #[test]
    fn test_overlapping_folds_merge() {
        let mut sink = sink_with(&["a", "b", "c", "d"]);
        sink.fold(&[FoldRegion::new(0, 2)]).unwrap();
        sink.fold(&[FoldRegion::new(1, 3)]).unwrap();
        assert_eq!(sink.folds(), &[FoldRegion::new(0, 3)]);
    }

    #[test]
    fn test_unfold_removes_exact_region() {
        let mut sink = sink_with(&["a", "b", "c", "d"]);
        sink.fold(&[FoldRegion::new(0, 2), FoldRegion::row(3)]).unwrap();
        sink.unfold(FoldRegion::new(0, 2)).unwrap();
        assert_eq!(sink.folds(), &[FoldRegion::row(3)]);
    }

    #[test]
    fn test_unfold_keeps_enclosing_fold() {
        let mut sink = sink_with(&["a", "b", "c", "d"]);
        sink.fold_all().unwrap();
        sink.unfold(FoldRegion::new(1, 3)).unwrap();
        assert_eq!(sink.folds(), &[FoldRegion::new(0, 4)]);
    }

    #[test]
    fn test_erase_head_shifts_folds() {
        let mut sink = sink_with(&["a", "b", "c", "d"]);
        sink.fold(&[FoldRegion::row(0), FoldRegion::new(2, 4)]).unwrap();
        sink.set_read_only(false);
        sink.erase_rows(0..1).unwrap();
        assert_eq!(sink.lines(), vec!["b", "c", "d"]);
        assert_eq!(sink.folds(), &[FoldRegion::new(1, 3)]);
    }

    #[test]
    fn test_fold_all_and_unfold_all() {
        let mut sink = sink_with(&["a", "b"]);
        sink.fold_all().unwrap();
        assert!(sink.visible_lines().is_empty());
        sink.unfold_all().unwrap();
        assert_eq!(sink.visible_lines(), vec!["a", "b"]);
    }

    #[test]
    fn test_scope() {
        let sink = BufferSink::new();
        let scope = sink.scope_at_selection().unwrap();
        assert!(is_remote_build_scope(&scope));
        assert!(!is_remote_build_scope("source.rust"));
    }
}
