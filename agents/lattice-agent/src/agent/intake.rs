//! Command Intake
//!
//! Handles command messages from the controller's commands topic. Each
//! message carries per-cluster lists of new commands and cancellations,
//! which are applied to the shared queue as a single atomic mutation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::agent::queue::{CancelRequest, Command, CommandQueue};

/// Per-cluster command payload inside an inbound message. Either list may
/// be absent on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterCommands {
    pub commands: Vec<Command>,
    pub cancel_commands: Vec<CancelRequest>,
}

/// A message delivered on the commands topic, grouping commands and
/// cancellations by cluster id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub clusters: HashMap<String, ClusterCommands>,
}

/// Converts inbound command messages into queue mutations.
///
/// Invoked synchronously per message by the connection's dispatch path; the
/// queue serializes concurrent invocations against each other and against
/// the executor.
#[derive(Debug, Clone)]
pub struct CommandIntake {
    queue: Arc<CommandQueue>,
}

impl CommandIntake {
    pub fn new(queue: Arc<CommandQueue>) -> Self {
        Self { queue }
    }

    /// Apply one inbound message to the queue.
    ///
    /// Cancellations and commands are accumulated across all clusters
    /// (order within a cluster is preserved), then applied in one critical
    /// section: cancellations first, new commands second.
    pub fn on_message(&self, message: InboundMessage) {
        let mut commands = Vec::new();
        let mut cancel_commands = Vec::new();

        for (cluster_id, entry) in message.clusters {
            debug!(
                cluster_id = %cluster_id,
                commands = entry.commands.len(),
                cancellations = entry.cancel_commands.len(),
                "Received commands for cluster"
            );
            commands.extend(entry.commands);
            cancel_commands.extend(entry.cancel_commands);
        }

        self.queue.apply(&cancel_commands, commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake() -> (CommandIntake, Arc<CommandQueue>) {
        let queue = Arc::new(CommandQueue::new());
        (CommandIntake::new(queue.clone()), queue)
    }

    fn parse(json: &str) -> InboundMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_new_command_is_enqueued() {
        let (intake, queue) = intake();

        intake.on_message(parse(
            r#"{"clusters":{"c1":{"commands":[{"id":"cmd1"}]}}}"#,
        ));

        assert_eq!(queue.pending_ids(), vec!["cmd1"]);
    }

    #[test]
    fn test_cancellation_removes_queued_command() {
        let (intake, queue) = intake();

        intake.on_message(parse(
            r#"{"clusters":{"c1":{"commands":[{"id":"cmd1"}]}}}"#,
        ));
        intake.on_message(parse(
            r#"{"clusters":{"c1":{"cancelCommands":[{"id":"cmd1"}]}}}"#,
        ));

        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_applies_before_enqueue_within_one_message() {
        let (intake, queue) = intake();

        intake.on_message(parse(
            r#"{"clusters":{"c1":{"commands":[{"id":"x"}]}}}"#,
        ));

        // Same message cancels the old "x" and delivers a replacement "x".
        intake.on_message(parse(
            r#"{"clusters":{"c1":{
                "cancelCommands":[{"id":"x"}],
                "commands":[{"id":"x","retry":true}]
            }}}"#,
        ));

        assert_eq!(queue.pending_ids(), vec!["x"]);
        let remaining = queue.dequeue().unwrap();
        assert_eq!(remaining.payload.get("retry"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn test_commands_accumulate_across_clusters() {
        let (intake, queue) = intake();

        intake.on_message(parse(
            r#"{"clusters":{
                "c1":{"commands":[{"id":"a1"},{"id":"a2"}]},
                "c2":{"commands":[{"id":"b1"}]}
            }}"#,
        ));

        let mut ids = queue.pending_ids();
        ids.sort();
        assert_eq!(ids, vec!["a1", "a2", "b1"]);

        // Per-cluster ordering survives accumulation.
        let all = queue.pending_ids();
        let a1 = all.iter().position(|id| id == "a1").unwrap();
        let a2 = all.iter().position(|id| id == "a2").unwrap();
        assert!(a1 < a2);
    }

    #[test]
    fn test_cluster_with_no_lists_is_tolerated() {
        let (intake, queue) = intake();

        intake.on_message(parse(r#"{"clusters":{"c1":{}}}"#));

        assert!(queue.is_empty());
    }
}
