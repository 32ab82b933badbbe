//! Render command queue.
//!
//! Any thread may enqueue; exactly one render loop consumes, in FIFO order.
//! Enqueueing never blocks. While the queue is closed, commands are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::trace;

use remote_build_core::LogFilter;

use crate::sink::ViewportPosition;

/// A unit of work for the render loop.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Newline-separated text flushed by the coalescer
    AppendLines(String),
    /// Erase the whole document
    Clear,
    /// Collapse everything
    FoldAll,
    /// Move to a row
    ScrollTo(usize),
    /// Set the viewport position
    SetViewportPosition(ViewportPosition),
    /// Install a new filter and re-derive every fold
    SetFilter(LogFilter),
}

#[derive(Debug)]
enum Message {
    Render(RenderCommand),
    Shutdown,
}

/// Create a connected, open queue and its receiver.
pub fn render_channel() -> (RenderQueue, RenderReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queue = RenderQueue {
        tx,
        open: Arc::new(AtomicBool::new(true)),
    };
    (
        queue,
        RenderReceiver {
            rx,
            shut_down: false,
        },
    )
}

/// Producer side of the render queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RenderQueue {
    tx: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

impl RenderQueue {
    /// Whether commands are currently accepted.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Stop accepting commands and tell the render loop to stop.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            let _ = self.tx.send(Message::Shutdown);
        }
    }

    /// Enqueue a command. Returns false if it was dropped.
    pub fn enqueue(&self, command: RenderCommand) -> bool {
        if !self.is_open() {
            trace!("Render queue closed, dropping {:?}", command);
            return false;
        }
        self.tx.send(Message::Render(command)).is_ok()
    }

    /// Enqueue a batch of lines.
    pub fn append_lines(&self, text: String) -> bool {
        self.enqueue(RenderCommand::AppendLines(text))
    }

    /// Enqueue a clear.
    pub fn clear(&self) -> bool {
        self.enqueue(RenderCommand::Clear)
    }

    /// Enqueue fold-all.
    pub fn fold_all(&self) -> bool {
        self.enqueue(RenderCommand::FoldAll)
    }

    /// Enqueue a scroll to `row`.
    pub fn scroll_to(&self, row: usize) -> bool {
        self.enqueue(RenderCommand::ScrollTo(row))
    }

    /// Enqueue a viewport change.
    pub fn set_viewport_position(&self, position: ViewportPosition) -> bool {
        self.enqueue(RenderCommand::SetViewportPosition(position))
    }

    /// Enqueue a filter change.
    pub fn set_filter(&self, filter: LogFilter) -> bool {
        self.enqueue(RenderCommand::SetFilter(filter))
    }
}

/// Consumer side of the render queue.
#[derive(Debug)]
pub struct RenderReceiver {
    rx: mpsc::UnboundedReceiver<Message>,
    /// Set once the shutdown marker has been taken off the channel
    shut_down: bool,
}

impl RenderReceiver {
    /// Next queued command without waiting.
    ///
    /// Returns `None` when the queue is empty or was shut down.
    pub fn try_next(&mut self) -> Option<RenderCommand> {
        if self.shut_down {
            return None;
        }
        match self.rx.try_recv() {
            Ok(Message::Render(command)) => Some(command),
            Ok(Message::Shutdown) | Err(TryRecvError::Disconnected) => {
                self.shut_down = true;
                None
            }
            Err(TryRecvError::Empty) => None,
        }
    }

    /// Whether the queue was shut down or every producer is gone.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Wait for the next command.
    ///
    /// Returns `None` once the queue is shut down or every producer is gone.
    /// Must not be called from inside an async runtime.
    pub fn blocking_next(&mut self) -> Option<RenderCommand> {
        if self.shut_down {
            return None;
        }
        match self.rx.blocking_recv() {
            Some(Message::Render(command)) => Some(command),
            Some(Message::Shutdown) | None => {
                self.shut_down = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(command: Option<RenderCommand>) -> Option<String> {
        match command {
            Some(RenderCommand::AppendLines(text)) => Some(text),
            _ => None,
        }
    }

    #[test]
    fn test_fifo_order() {
        let (queue, mut receiver) = render_channel();
        queue.append_lines("a".to_string());
        queue.clear();
        queue.append_lines("b".to_string());

        assert_eq!(text(receiver.try_next()), Some("a".to_string()));
        assert!(matches!(receiver.try_next(), Some(RenderCommand::Clear)));
        assert_eq!(text(receiver.try_next()), Some("b".to_string()));
        assert!(receiver.try_next().is_none());
    }

    #[test]
    fn test_closed_queue_drops_commands() {
        let (queue, mut receiver) = render_channel();
        queue.close();
        assert!(!queue.is_open());
        assert!(!queue.fold_all());
        assert!(receiver.try_next().is_none());
    }

    #[test]
    fn test_blocking_next_stops_on_close() {
        let (queue, mut receiver) = render_channel();
        let producer = queue.clone();
        let handle = std::thread::spawn(move || {
            producer.scroll_to(3);
            producer.close();
        });
        assert!(matches!(receiver.blocking_next(), Some(RenderCommand::ScrollTo(3))));
        assert!(receiver.blocking_next().is_none());
        handle.join().unwrap();
    }

    #[test]
    fn test_shutdown_seen_by_drain_stops_blocking_next() {
        let (queue, mut receiver) = render_channel();
        queue.append_lines("a\n".to_string());
        queue.close();

        assert_eq!(text(receiver.try_next()), Some("a\n".to_string()));
        assert!(receiver.try_next().is_none());
        assert!(receiver.is_shut_down());
        // Producer still alive; must not wait
        assert!(receiver.blocking_next().is_none());
        drop(queue);
    }
}
