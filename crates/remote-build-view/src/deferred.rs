//! Cancellable deferred task.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A callback scheduled to run once after a delay, unless cancelled first.
#[derive(Debug)]
pub struct DeferredTask {
    handle: JoinHandle<()>,
}

impl DeferredTask {
    /// Run `callback` on `runtime` after `delay`.
    pub fn schedule<F>(runtime: &Handle, delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Self { handle }
    }

    /// Cancel the task. A callback that already started still completes.
    pub fn cancel(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    #[test]
    fn test_runs_after_delay() {
        let runtime = Runtime::new().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let _task = DeferredTask::schedule(runtime.handle(), Duration::from_millis(20), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        std::thread::sleep(Duration::from_millis(200));

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_prevents_callback() {
        let runtime = Runtime::new().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let task = DeferredTask::schedule(runtime.handle(), Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();
        std::thread::sleep(Duration::from_millis(200));

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
