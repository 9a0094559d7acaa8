//! Flow: one logical result stream a caller repeatedly waits on.
//!
//! Thin composition of a cancellable scope (child of the dispatcher root)
//! and a [`TaskGroup`]. Identity is stable from first push until the flow is
//! explicitly stopped or the dispatcher is destroyed.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;

use super::task_group::TaskGroup;

pub struct Flow {
    key: String,
    cancel: CancellationToken,
    group: TaskGroup,
}

impl Flow {
    pub(crate) fn new(
        root_token: &CancellationToken,
        key: impl Into<String>,
        channel_capacity: usize,
    ) -> Self {
        let cancel = root_token.child_token();
        let group = TaskGroup::new(cancel.clone(), channel_capacity);

        Self {
            key: key.into(),
            cancel,
            group,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn group(&self) -> &TaskGroup {
        &self.group
    }

    /// Resolves when the flow or any enclosing scope is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel the flow's scope and every task under it.
    pub(crate) fn stop(&self) {
        self.cancel.cancel();
        self.group.cancel_all();
        debug!(flow_key = %self.key, "flow stopped");
    }
}
