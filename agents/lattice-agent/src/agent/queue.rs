//! Command Queue
//!
//! The shared work queue of pending commands, mutated by inbound intake
//! (cancel + enqueue) and drained by the command executor.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A command received from the controller, pending execution.
///
/// The payload is opaque to the queue; only the identifier matters here,
/// since cancellation targets commands by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: String,

    /// Remaining command fields, passed through to the executor unmodified.
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// A cancellation request referencing a previously sent command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub id: String,

    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// Thread-safe queue of pending commands.
///
/// All mutating methods acquire the internal lock, so callers never deal
/// with lock handles directly. Composite mutations that must be atomic with
/// respect to the executor go through [`CommandQueue::apply`].
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Mutex<VecDeque<Command>>,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append commands to the back of the queue, preserving their order.
    /// No deduplication is performed.
    pub fn enqueue(&self, commands: Vec<Command>) {
        let mut pending = self.pending.lock();
        Self::enqueue_locked(&mut pending, commands);
    }

    /// Remove every pending command targeted by one of the cancel requests.
    ///
    /// Commands already handed to the executor are unaffected; cancellation
    /// is best-effort for work that has not started.
    pub fn cancel(&self, requests: &[CancelRequest]) {
        let mut pending = self.pending.lock();
        Self::cancel_locked(&mut pending, requests);
    }

    /// Apply cancellations and then enqueue new commands as one critical
    /// section. No other queue user can observe the state in between.
    ///
    /// Cancelling first guarantees a cancellation carried in the same
    /// message never removes a command enqueued by that message.
    pub fn apply(&self, cancels: &[CancelRequest], commands: Vec<Command>) {
        let mut pending = self.pending.lock();
        Self::cancel_locked(&mut pending, cancels);
        Self::enqueue_locked(&mut pending, commands);
    }

    /// Take the next pending command, if any. Used by the executor.
    pub fn dequeue(&self) -> Option<Command> {
        self.pending.lock().pop_front()
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Identifiers of all pending commands, in queue order.
    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.lock().iter().map(|c| c.id.clone()).collect()
    }

    fn enqueue_locked(pending: &mut VecDeque<Command>, commands: Vec<Command>) {
        pending.extend(commands);
    }

    fn cancel_locked(pending: &mut VecDeque<Command>, requests: &[CancelRequest]) {
        if requests.is_empty() {
            return;
        }
        pending.retain(|command| !requests.iter().any(|r| r.id == command.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn command(id: &str) -> Command {
        Command {
            id: id.to_string(),
            payload: serde_json::Map::new(),
        }
    }

    fn cancel(id: &str) -> CancelRequest {
        CancelRequest {
            id: id.to_string(),
            payload: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_enqueue_preserves_order() {
        let queue = CommandQueue::new();
        queue.enqueue(vec![command("a"), command("b"), command("c")]);

        assert_eq!(queue.pending_ids(), vec!["a", "b", "c"]);
        assert_eq!(queue.dequeue().unwrap().id, "a");
        assert_eq!(queue.dequeue().unwrap().id, "b");
        assert_eq!(queue.dequeue().unwrap().id, "c");
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_cancel_removes_pending_command() {
        let queue = CommandQueue::new();
        queue.enqueue(vec![command("cmd1"), command("cmd2")]);

        queue.cancel(&[cancel("cmd1")]);

        assert_eq!(queue.pending_ids(), vec!["cmd2"]);
    }

    #[test]
    fn test_cancel_does_not_affect_dequeued_command() {
        let queue = CommandQueue::new();
        queue.enqueue(vec![command("cmd1")]);

        let in_progress = queue.dequeue().unwrap();
        queue.cancel(&[cancel("cmd1")]);

        assert_eq!(in_progress.id, "cmd1");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_apply_cancels_before_enqueue() {
        let queue = CommandQueue::new();
        queue.enqueue(vec![command("x")]);

        // A cancellation for "x" arriving together with a new command "x"
        // must remove the old one and keep the new one.
        queue.apply(&[cancel("x")], vec![command("x")]);

        assert_eq!(queue.pending_ids(), vec!["x"]);
    }

    #[test]
    fn test_apply_never_exposes_partial_state() {
        let queue = Arc::new(CommandQueue::new());
        queue.enqueue(vec![command("seed")]);

        let mutator = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                let mut previous = "seed".to_string();
                for i in 0..1000 {
                    let next = format!("cmd-{i}");
                    queue.apply(&[cancel(&previous)], vec![command(&next)]);
                    previous = next;
                }
            })
        };

        // Each apply removes the previous command and adds exactly one new
        // one, so an observer must never see more than one pending entry.
        for _ in 0..1000 {
            assert!(queue.len() <= 1);
        }

        mutator.join().unwrap();
        assert_eq!(queue.pending_ids(), vec!["cmd-999"]);
    }

    #[test]
    fn test_enqueue_does_not_deduplicate() {
        let queue = CommandQueue::new();
        queue.enqueue(vec![command("dup"), command("dup")]);
        assert_eq!(queue.len(), 2);
    }
}
