//! The command queue between the public API, the sensors, and the worker.
//!
//! FIFO, unbounded, single consumer. Enqueueing never blocks and is safe
//! from any task or thread; the worker side waits with a bounded timeout so
//! it can service the occupancy failsafe between commands.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::command::DoorCommand;

/// Producer half: clonable, non-blocking enqueue.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<DoorCommand>,
}

impl CommandQueue {
    /// Create a connected queue/stream pair.
    #[must_use]
    pub fn channel() -> (CommandQueue, CommandStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CommandQueue { tx }, CommandStream { rx })
    }

    /// Enqueue a command.
    ///
    /// Never blocks and never fails into the caller; a send after the
    /// worker has shut down is dropped with a debug log.
    pub fn push(&self, command: DoorCommand) {
        if let Err(e) = self.tx.send(command) {
            debug!(kind = %e.0.kind, "command dropped, worker already stopped");
        }
    }
}

/// Outcome of one bounded wait on the stream.
#[derive(Debug)]
pub enum WaitOutcome {
    /// A command arrived.
    Command(DoorCommand),
    /// Nothing arrived within the wait window.
    TimedOut,
    /// Every producer is gone; no command can ever arrive again.
    Closed,
}

/// Consumer half: owned by the single worker.
#[derive(Debug)]
pub struct CommandStream {
    rx: mpsc::UnboundedReceiver<DoorCommand>,
}

impl CommandStream {
    /// Wait up to `wait` for the next command.
    pub async fn next(&mut self, wait: Duration) -> WaitOutcome {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(command)) => WaitOutcome::Command(command),
            Ok(None) => WaitOutcome::Closed,
            Err(_) => WaitOutcome::TimedOut,
        }
    }

    /// Whether the queue is currently drained.
    ///
    /// The worker consults this right after a dequeue: an unforced command
    /// only executes when nothing newer is waiting behind it.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DoorCommand;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn fifo_order_is_preserved() {
        let (queue, mut stream) = CommandQueue::channel();

        queue.push(DoorCommand::unlock(Some("a".into()), false));
        queue.push(DoorCommand::lock(Some("b".into()), false));

        let first = match stream.next(Duration::from_secs(1)).await {
            WaitOutcome::Command(c) => c,
            other => panic!("expected command, got {other:?}"),
        };
        assert_eq!(first.requester.as_deref(), Some("a"));
        assert!(!stream.is_empty());

        let second = match stream.next(Duration::from_secs(1)).await {
            WaitOutcome::Command(c) => c,
            other => panic!("expected command, got {other:?}"),
        };
        assert_eq!(second.requester.as_deref(), Some("b"));
        assert!(stream.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_times_out() {
        let (_queue, mut stream) = CommandQueue::channel();
        assert!(matches!(
            stream.next(Duration::from_secs(10)).await,
            WaitOutcome::TimedOut
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn closed_when_all_producers_drop() {
        let (queue, mut stream) = CommandQueue::channel();
        drop(queue);
        assert!(matches!(
            stream.next(Duration::from_secs(10)).await,
            WaitOutcome::Closed
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn push_after_close_is_silently_dropped() {
        let (queue, stream) = CommandQueue::channel();
        drop(stream);
        // Must not panic or block.
        queue.push(DoorCommand::stop());
    }

    #[tokio::test(start_paused = true)]
    async fn clones_feed_the_same_stream() {
        let (queue, mut stream) = CommandQueue::channel();
        let clone = queue.clone();

        clone.push(DoorCommand::stop());
        assert!(matches!(
            stream.next(Duration::from_secs(1)).await,
            WaitOutcome::Command(_)
        ));
    }
}
