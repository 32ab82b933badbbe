//! The render loop: the single consumer of the render queue.

use tracing::{debug, error, info};

use remote_build_core::{LogFilter, Result, ViewSettings};

use crate::document::LogDocument;
use crate::fold::{FoldEngine, FoldUpdate};
use crate::queue::{RenderCommand, RenderReceiver};
use crate::sink::DisplaySink;

/// Applies queued render commands to a display sink.
///
/// Owns the sink, the log document and the fold state. Runs on one thread;
/// nothing else touches the sink.
pub struct RenderLoop<S: DisplaySink> {
    receiver: RenderReceiver,
    sink: S,
    document: LogDocument,
    engine: FoldEngine,
    filter: LogFilter,
    auto_scroll: bool,
}

impl<S: DisplaySink> RenderLoop<S> {
    /// Attach a render loop to `sink`.
    pub fn new(receiver: RenderReceiver, sink: S, settings: &ViewSettings) -> Result<Self> {
        Ok(Self {
            receiver,
            sink,
            document: LogDocument::new(settings.max_lines),
            engine: FoldEngine::new(),
            filter: LogFilter::new(&settings.filter)?,
            auto_scroll: settings.auto_scroll,
        })
    }

    /// The display sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The retained log lines.
    pub fn document(&self) -> &LogDocument {
        &self.document
    }

    /// The active filter.
    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    /// The currently open fold region.
    pub fn fold_engine(&self) -> &FoldEngine {
        &self.engine
    }

    /// Drain every queued command without waiting for more.
    ///
    /// A failing command is logged and skipped. Auto-scroll runs afterwards
    /// regardless. Returns the number of commands taken off the queue.
    pub fn render(&mut self) -> usize {
        let mut applied = 0;
        while let Some(command) = self.receiver.try_next() {
            self.apply_logged(command);
            applied += 1;
        }
        self.scroll_to_end();
        applied
    }

    /// Block for work, then drain, until the queue is shut down.
    pub fn run(&mut self) {
        info!("Render loop started");
        while let Some(command) = self.receiver.blocking_next() {
            self.apply_logged(command);
            self.render();
        }
        info!("Render loop stopped");
    }

    fn apply_logged(&mut self, command: RenderCommand) {
        if let Err(e) = self.apply(command) {
            error!("Render command failed: {}", e);
        }
    }

    fn scroll_to_end(&mut self) {
        if self.auto_scroll {
            if let Err(e) = self.sink.show_end() {
                error!("Auto-scroll failed: {}", e);
            }
        }
    }

    fn apply(&mut self, command: RenderCommand) -> Result<()> {
        match command {
            RenderCommand::AppendLines(text) => {
                for line in text.split('\n') {
                    let line = line.trim_end_matches('\r');
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.append_line(line)?;
                }
                Ok(())
            }
            RenderCommand::Clear => self.clear(),
            RenderCommand::FoldAll => self.sink.fold_all(),
            RenderCommand::ScrollTo(row) => self.sink.scroll_to_line(row),
            RenderCommand::SetViewportPosition(position) => {
                self.sink.set_viewport_position(position)
            }
            RenderCommand::SetFilter(filter) => self.reapply(filter),
        }
    }

    fn append_line(&mut self, line: &str) -> Result<()> {
        self.sink.set_read_only(false);
        let inserted = self.insert(line);
        self.sink.set_read_only(true);
        let row = inserted?;

        if let FoldUpdate::Fold { previous, region } =
            self.engine.classify(&self.filter, row, line)
        {
            if let Some(previous) = previous {
                self.sink.unfold(previous)?;
            }
            self.sink.fold(&[region])?;
        }
        Ok(())
    }

    fn insert(&mut self, line: &str) -> Result<usize> {
        let overflow = self.document.overflow_for_next();
        if overflow > 0 {
            self.sink.erase_rows(0..overflow)?;
            self.document.evict_oldest(overflow);
            self.engine.rows_evicted(overflow);
        }
        self.sink.append_line(line)?;
        Ok(self.document.push(line))
    }

    fn clear(&mut self) -> Result<()> {
        debug!("Clearing {} lines", self.document.len());
        self.sink.set_read_only(false);
        let erased = self.sink.erase_rows(0..self.sink.row_count());
        self.sink.set_read_only(true);
        self.document.clear();
        self.engine.reset();
        erased
    }

    fn reapply(&mut self, filter: LogFilter) -> Result<()> {
        info!("Applying filter '{}'", filter.pattern());
        self.filter = filter;
        self.sink.unfold_all()?;
        let regions = self.engine.reapply(&self.filter, self.document.iter());
        if regions.is_empty() {
            return Ok(());
        }
        self.sink.fold(&regions)
    }
}
