//! Line coalescing between the session reader and the render queue.
//!
//! Fragments accumulate in a pending buffer. Once more than the threshold of
//! newlines is buffered the text is flushed at once; otherwise a debounce
//! timer flushes whatever is buffered after a short idle period. One lock
//! guards the buffer, the timer handle and the enqueue on flush.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use remote_build_core::ViewSettings;

use crate::deferred::DeferredTask;
use crate::queue::RenderQueue;

#[derive(Debug, Default)]
struct PendingBuffer {
    text: String,
    timer: Option<DeferredTask>,
    /// Bumped whenever a timer is armed; a firing timer only flushes if it is still current.
    generation: u64,
}

/// Batches raw output fragments into line-oriented flushes.
#[derive(Debug, Clone)]
pub struct LineCoalescer {
    pending: Arc<Mutex<PendingBuffer>>,
    queue: RenderQueue,
    runtime: Handle,
    debounce: Duration,
    flush_threshold: usize,
}

impl LineCoalescer {
    /// Create a coalescer feeding `queue`, running its timers on `runtime`.
    pub fn new(queue: RenderQueue, runtime: Handle, settings: &ViewSettings) -> Self {
        Self {
            pending: Arc::new(Mutex::new(PendingBuffer::default())),
            queue,
            runtime,
            debounce: Duration::from_millis(settings.debounce_ms),
            flush_threshold: settings.flush_threshold,
        }
    }

    /// Buffer a fragment. No-op while the render queue is closed.
    pub fn feed(&self, fragment: &str) {
        if !self.queue.is_open() {
            return;
        }

        let mut pending = self.lock();
        pending.text.push_str(fragment);
        if let Some(timer) = pending.timer.take() {
            timer.cancel();
        }

        if pending.text.matches('\n').count() > self.flush_threshold {
            self.flush_locked(&mut pending);
        } else {
            pending.generation = pending.generation.wrapping_add(1);
            let generation = pending.generation;
            let this = self.clone();
            pending.timer = Some(DeferredTask::schedule(
                &self.runtime,
                self.debounce,
                move || this.flush_expired(generation),
            ));
        }
    }

    /// Flush whatever is buffered right now.
    pub fn flush(&self) {
        let mut pending = self.lock();
        self.flush_locked(&mut pending);
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.lock().text.len()
    }

    fn flush_expired(&self, generation: u64) {
        let mut pending = self.lock();
        if pending.timer.is_none() || pending.generation != generation {
            return;
        }
        // This is the running timer; dropping the handle is enough.
        pending.timer = None;
        self.flush_locked(&mut pending);
    }

    fn flush_locked(&self, pending: &mut PendingBuffer) {
        if let Some(timer) = pending.timer.take() {
            timer.cancel();
        }
        if pending.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut pending.text);
        debug!("Flushing {} buffered bytes", text.len());
        self.queue.append_lines(text);
    }

    fn lock(&self) -> MutexGuard<'_, PendingBuffer> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
