//! Bounded, append-only log document.

use std::collections::VecDeque;

/// Ordered log lines with a hard cap on how many are retained.
///
/// Eviction is strictly FIFO and happens one whole line at a time, only as
/// far as needed to admit the next line.
#[derive(Debug, Clone)]
pub struct LogDocument {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogDocument {
    /// Create an empty document holding at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Current line count.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of head lines that must go before one more line fits.
    pub fn overflow_for_next(&self) -> usize {
        (self.lines.len() + 1).saturating_sub(self.capacity)
    }

    /// Drop `count` lines from the head.
    pub fn evict_oldest(&mut self, count: usize) {
        let count = count.min(self.lines.len());
        self.lines.drain(..count);
    }

    /// Append a line and return its row.
    ///
    /// Callers evict first; see [`LogDocument::overflow_for_next`].
    pub fn push(&mut self, line: &str) -> usize {
        self.lines.push_back(line.to_string());
        self.lines.len() - 1
    }

    /// Iterate rows from the top.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
