//! Dispatcher configuration.
//!
//! The engine has one tunable: the capacity of each flow's shared result
//! channel. The default of 1 gives rendezvous hand-off semantics, where a
//! forwarded result is only accepted once a `wait` call is receiving.
//! Logging verbosity is configured separately through the `TASKFLOW_LOG`
//! environment variable (see [`crate::logging`]).

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Buffer size of each flow's shared outbound result channel.
    /// Values below 1 are treated as 1.
    pub result_channel_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            result_channel_capacity: 1,
        }
    }
}

impl DispatcherConfig {
    /// Effective channel capacity, clamped to the tokio minimum of 1.
    pub fn channel_capacity(&self) -> usize {
        self.result_channel_capacity.max(1)
    }
}
