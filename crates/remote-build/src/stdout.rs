//! Display sink printing the visible log to a writer.
//!
//! Wraps a [`BufferSink`] for document and fold state. New rows are printed
//! whenever the end of the document is brought into view, with each run of
//! hidden rows collapsed into a `[... N hidden]` marker. A run still open at
//! the end of the output is held back until a visible row closes it, so one
//! run gets one marker however many drains it spans. Changes that move folds
//! over rows already printed (a new filter, fold-all) repaint the whole
//! visible log on the next pass.

use std::io::Write;
use std::ops::Range;

use remote_build_core::{FoldRegion, Result};
use remote_build_view::{BufferSink, DisplaySink, ViewportPosition};

/// A [`DisplaySink`] that renders to any writer, normally stdout.
#[derive(Debug)]
pub struct StdoutSink<W: Write> {
    buffer: BufferSink,
    out: W,
    /// Rows at the end of the buffer not printed yet
    unprinted: usize,
    /// Hidden rows printed since the last visible row, marker not yet written
    hidden_run: usize,
    repaint: bool,
}

impl<W: Write> StdoutSink<W> {
    /// Render into `out`.
    pub fn new(out: W) -> Self {
        Self {
            buffer: BufferSink::new(),
            out,
            unprinted: 0,
            hidden_run: 0,
            repaint: false,
        }
    }

    /// The document and fold state behind the output.
    pub fn buffer(&self) -> &BufferSink {
        &self.buffer
    }

    /// The writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn print_rows(&mut self, rows: Range<usize>) -> Result<()> {
        for row in rows {
            if self.buffer.is_hidden(row) {
                self.hidden_run += 1;
                continue;
            }
            self.print_hidden_marker()?;
            if let Some(line) = self.buffer.line(row) {
                writeln!(self.out, "{line}")?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn print_hidden_marker(&mut self) -> Result<()> {
        if self.hidden_run > 0 {
            writeln!(self.out, "[... {} hidden]", self.hidden_run)?;
            self.hidden_run = 0;
        }
        Ok(())
    }
}

impl<W: Write> DisplaySink for StdoutSink<W> {
    fn append_line(&mut self, line: &str) -> Result<()> {
        self.buffer.append_line(line)?;
        self.unprinted += 1;
        Ok(())
    }

    fn erase_rows(&mut self, rows: Range<usize>) -> Result<()> {
        self.buffer.erase_rows(rows)?;
        self.unprinted = self.unprinted.min(self.buffer.row_count());
        if self.buffer.row_count() == 0 {
            self.hidden_run = 0;
        }
        Ok(())
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.buffer.set_read_only(read_only);
    }

    fn fold(&mut self, regions: &[FoldRegion]) -> Result<()> {
        self.buffer.fold(regions)
    }

    fn unfold(&mut self, region: FoldRegion) -> Result<()> {
        self.buffer.unfold(region)
    }

    fn unfold_all(&mut self) -> Result<()> {
        self.repaint = true;
        self.buffer.unfold_all()
    }

    fn fold_all(&mut self) -> Result<()> {
        self.repaint = true;
        self.buffer.fold_all()
    }

    fn scroll_to_line(&mut self, row: usize) -> Result<()> {
        self.buffer.scroll_to_line(row)?;
        if let Some(row) = self.buffer.cursor_row() {
            if let Some(line) = self.buffer.line(row) {
                writeln!(self.out, "{:>6}: {}", row, line)?;
                self.out.flush()?;
            }
        }
        Ok(())
    }

    fn set_viewport_position(&mut self, position: ViewportPosition) -> Result<()> {
        self.buffer.set_viewport_position(position)
    }

    fn show_end(&mut self) -> Result<()> {
        self.buffer.show_end()?;
        let rows = self.buffer.row_count();
        if self.repaint {
            // A repaint is a full snapshot, so its trailing run is written out
            self.repaint = false;
            self.unprinted = 0;
            self.hidden_run = 0;
            self.print_rows(0..rows)?;
            self.print_hidden_marker()?;
            self.out.flush()?;
            return Ok(());
        }
        if self.unprinted == 0 {
            return Ok(());
        }
        let start = rows - self.unprinted;
        self.unprinted = 0;
        self.print_rows(start..rows)
    }

    fn size(&self) -> usize {
        self.buffer.size()
    }

    fn row_count(&self) -> usize {
        self.buffer.row_count()
    }

    fn scope_at_selection(&self) -> Option<String> {
        self.buffer.scope_at_selection()
    }
}
