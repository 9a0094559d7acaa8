//! # Messages and Results
//!
//! Immutable value types describing a unit of work ([`Message`]) and one
//! chunk of its output ([`TaskResult`]).
//!
//! Internally a result carries a tagged [`Outcome`] so "more output follows"
//! is structurally explicit; at the `wait` boundary it flattens back to the
//! compact JSON wire shape with short field names (`fk`, `md`, `tk`, `er`,
//! `pl`, `hn`, `ems`) expected by embedding hosts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer code identifying which handler capability processes a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Method(pub u16);

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work submitted by a caller.
///
/// `task_key` must be unique among the live tasks of its flow; the engine
/// does not police duplicates (see the TaskGroup contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "fk")]
    pub flow_key: String,
    #[serde(rename = "md")]
    pub method: Method,
    #[serde(rename = "tk")]
    pub task_key: String,
    #[serde(rename = "pl")]
    pub payload: String,
}

/// How a single result relates to its task's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Success, and the task will publish at least one more result.
    Partial,
    /// Terminal success.
    Complete,
    /// Terminal failure. Always terminal, never followed by more output.
    Failed,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Partial)
    }

    pub fn is_error(self) -> bool {
        matches!(self, Outcome::Failed)
    }

    pub fn has_next(self) -> bool {
        matches!(self, Outcome::Partial)
    }
}

/// One chunk of a task's output.
///
/// Produced only by handler implementations through [`Task::publish`].
///
/// [`Task::publish`]: crate::engine::Task::publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub flow_key: String,
    pub method: Method,
    pub task_key: String,
    pub payload: String,
    pub outcome: Outcome,
    /// Wall-clock handler execution time in milliseconds.
    pub execution_ms: u64,
}

impl TaskResult {
    /// Terminal success for `message`'s task.
    pub fn success(message: &Message, payload: impl Into<String>, execution_ms: u64) -> Self {
        Self::build(message, payload, Outcome::Complete, execution_ms)
    }

    /// Successful chunk with more output to follow.
    pub fn success_with_next(
        message: &Message,
        payload: impl Into<String>,
        execution_ms: u64,
    ) -> Self {
        Self::build(message, payload, Outcome::Partial, execution_ms)
    }

    /// Terminal failure for `message`'s task.
    pub fn failure(message: &Message, payload: impl Into<String>) -> Self {
        Self::build(message, payload, Outcome::Failed, 0)
    }

    fn build(
        message: &Message,
        payload: impl Into<String>,
        outcome: Outcome,
        execution_ms: u64,
    ) -> Self {
        Self {
            flow_key: message.flow_key.clone(),
            method: message.method,
            task_key: message.task_key.clone(),
            payload: payload.into(),
            outcome,
            execution_ms,
        }
    }

    /// Serialize to the compact JSON wire shape returned from `wait`.
    pub fn to_wire_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&WireResult::from(self))
    }
}

/// Wire representation of a result: short field names, flattened flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireResult {
    #[serde(rename = "fk")]
    pub flow_key: String,
    #[serde(rename = "md")]
    pub method: Method,
    #[serde(rename = "tk")]
    pub task_key: String,
    #[serde(rename = "er")]
    pub is_error: bool,
    #[serde(rename = "pl")]
    pub payload: String,
    #[serde(rename = "hn")]
    pub has_next: bool,
    #[serde(rename = "ems")]
    pub execution_ms: u64,
}

impl From<&TaskResult> for WireResult {
    fn from(result: &TaskResult) -> Self {
        Self {
            flow_key: result.flow_key.clone(),
            method: result.method,
            task_key: result.task_key.clone(),
            is_error: result.outcome.is_error(),
            payload: result.payload.clone(),
            has_next: result.outcome.has_next(),
            execution_ms: result.execution_ms,
        }
    }
}
