//! Owned background tasks.
//!
//! Every delay and request the controller waits on is a task it owns.
//! Cancelling aborts the tasks; events that were already queued are still
//! tagged with the attempt token they were scheduled under and get discarded
//! on arrival.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

/// A set of pending delayed sends and in-flight requests.
#[derive(Debug, Default)]
pub(crate) struct DelayedTasks {
    handles: Vec<JoinHandle<()>>,
}

impl DelayedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `event` on `tx` after `delay`.
    pub fn schedule<E>(&mut self, delay: Duration, tx: &UnboundedSender<E>, event: E)
    where
        E: Send + 'static,
    {
        let tx = tx.clone();
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone once the controller has shut down.
            let _ = tx.send(event);
        });
    }

    /// Run `task` until it completes or the set is cancelled.
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handles.retain(|handle| !handle.is_finished());
        self.handles.push(tokio::spawn(task));
    }

    /// Abort every pending task.
    pub fn cancel_all(&mut self) {
        if !self.handles.is_empty() {
            trace!(count = self.handles.len(), "Cancelling delayed tasks");
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    pub fn pending(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }
}

impl Drop for DelayedTasks {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = DelayedTasks::new();
        let start = tokio::time::Instant::now();

        tasks.schedule(Duration::from_secs(2), &tx, "fired");
        assert_eq!(rx.recv().await, Some("fired"));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = DelayedTasks::new();

        tasks.schedule(Duration::from_secs(1), &tx, 1);
        tasks.schedule(Duration::from_secs(3), &tx, 2);
        assert_eq!(tasks.pending(), 2);
        tasks.cancel_all();
        tasks.cancel_all();

        tasks.schedule(Duration::from_secs(5), &tx, 3);
        assert_eq!(rx.recv().await, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_running_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = DelayedTasks::new();

        let started = tx.clone();
        tasks.spawn(async move {
            let _ = started.send("started");
            tokio::time::sleep(Duration::from_secs(10)).await;
            let _ = started.send("finished");
        });
        assert_eq!(rx.recv().await, Some("started"));
        assert_eq!(tasks.pending(), 1);

        tasks.cancel_all();
        drop(tx);
        // Every sender is gone once the aborted task is dropped.
        assert_eq!(rx.recv().await, None);
    }
}
