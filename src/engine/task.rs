//! Task: the execution lifecycle of one submitted message.
//!
//! A task owns a cancellation scope nested under its flow's scope and a
//! single-slot rendezvous channel through which the handler implementation
//! hands results to the supervising relay. Exactly one handler invocation
//! is associated with a task.

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::trace;

use crate::messaging::{Message, TaskResult};

/// Capacity of the task's private result channel. One slot: the handler
/// blocks in `publish` until the relay takes the previous result.
const TASK_CHANNEL_CAPACITY: usize = 1;

pub struct Task {
    message: Message,
    cancel: CancellationToken,
    results_tx: mpsc::Sender<TaskResult>,
}

impl Task {
    /// Create a task under `flow_token`, returning it together with the
    /// receiving end of its private result channel for the relay loop.
    pub(crate) fn new(
        flow_token: &CancellationToken,
        message: Message,
    ) -> (Self, mpsc::Receiver<TaskResult>) {
        let (results_tx, results_rx) = mpsc::channel(TASK_CHANNEL_CAPACITY);

        let task = Self {
            message,
            cancel: flow_token.child_token(),
            results_tx,
        };

        (task, results_rx)
    }

    /// The message this task was created from.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Resolves when this task, its flow, or the whole dispatcher is
    /// cancelled. Handler implementations must select on this and stop
    /// promptly.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel this task. Idempotent and safe to call concurrently.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Hand a result to the supervising relay.
    ///
    /// Delivers if the task is not yet cancelled and the relay becomes ready
    /// before the task's scope ends; otherwise the attempt is abandoned
    /// silently. Never blocks past cancellation.
    pub async fn publish(&self, result: TaskResult) {
        tokio::select! {
            // Cancellation checked first: once the task is cancelled no
            // further result may be handed off, even if a receiver is ready.
            biased;
            _ = self.cancel.cancelled() => {
                trace!(task_key = %self.message.task_key, "result abandoned, task cancelled");
            }
            sent = self.results_tx.send(result) => {
                if sent.is_err() {
                    trace!(task_key = %self.message.task_key, "result abandoned, relay gone");
                }
            }
        }
    }
}
