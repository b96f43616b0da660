//! Finite, ordered event streams.

use fermata_core::event::TaskEvent;
use tokio::sync::mpsc;

/// A single-pass, ordered, finite sequence of [`TaskEvent`]s.
///
/// Each executor call (run or resume) produces one stream. The stream ends
/// after a terminal event (`TaskCompleted`/`TaskFailed`) or after a
/// `SuspensionRequested`; resuming a suspended task yields a new stream that
/// continues the logical event log, not the same one.
pub struct EventStream {
    rx: mpsc::Receiver<TaskEvent>,
}

impl EventStream {
    /// Create a bounded channel and the stream wrapping its receiving end.
    pub(crate) fn channel(capacity: usize) -> (mpsc::Sender<TaskEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Receive the next event, or `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<TaskEvent> {
        self.rx.recv().await
    }

    /// Drain the stream into a vector, preserving emission order.
    pub async fn collect(mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}
