//! Built-in delay handler.
//!
//! Simulates work by sleeping for a payload-supplied number of
//! milliseconds, reacting to task cancellation mid-sleep. Registered by
//! convention under method code 1 ([`SLEEP_METHOD`]).

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use crate::engine::Task;
use crate::messaging::{Method, TaskResult};
use crate::registry::MessageHandler;

/// Conventional method code for the delay handler.
pub const SLEEP_METHOD: Method = Method(1);

/// Expected payload: `{"duration": <milliseconds>}`.
#[derive(Debug, Deserialize)]
struct SleepPayload {
    duration: i64,
}

#[derive(Debug, Default)]
pub struct SleepHandler;

impl SleepHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessageHandler for SleepHandler {
    async fn handle(&self, task: Arc<Task>) {
        let started = Instant::now();
        let message = task.message().clone();

        let payload: SleepPayload = match serde_json::from_str(&message.payload) {
            Ok(payload) => payload,
            Err(err) => {
                task.publish(TaskResult::failure(
                    &message,
                    format!("sleep: parse error: {err}"),
                ))
                .await;
                return;
            }
        };

        if payload.duration <= 0 {
            task.publish(TaskResult::failure(
                &message,
                "sleep: duration must be greater than zero",
            ))
            .await;
            return;
        }

        tokio::select! {
            _ = task.cancelled() => {
                trace!(task_key = %message.task_key, "sleep interrupted");
                task.publish(TaskResult::failure(&message, "sleep: closed by task stop"))
                    .await;
            }
            _ = tokio::time::sleep(Duration::from_millis(payload.duration as u64)) => {
                let execution_ms = started.elapsed().as_millis() as u64;
                task.publish(TaskResult::success(&message, "", execution_ms)).await;
            }
        }
    }
}
