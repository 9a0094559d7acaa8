//! Per-flow task bookkeeping.
//!
//! A group tracks its flow's live tasks by key, forwards task results into
//! the flow's shared outbound channel, and supports both point cancellation
//! of one task and group-wide cancellation. The live count mirrors the map
//! size and is readable without the lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::task::Task;
use crate::messaging::{Message, TaskResult};

pub struct TaskGroup {
    /// The owning flow's cancellation scope. Guards every outbound send so a
    /// racing `cancel_all` can never strand a forwarder.
    cancel: CancellationToken,
    tasks: Mutex<HashMap<String, Arc<Task>>>,
    live: AtomicUsize,
    results_tx: mpsc::Sender<TaskResult>,
    results_rx: tokio::sync::Mutex<mpsc::Receiver<TaskResult>>,
}

impl TaskGroup {
    pub(crate) fn new(cancel: CancellationToken, channel_capacity: usize) -> Self {
        let (results_tx, results_rx) = mpsc::channel(channel_capacity.max(1));

        Self {
            cancel,
            tasks: Mutex::new(HashMap::new()),
            live: AtomicUsize::new(0),
            results_tx,
            results_rx: tokio::sync::Mutex::new(results_rx),
        }
    }

    /// Allocate a new task for `message` and insert it by task key.
    ///
    /// Task keys must be unique among live tasks; registering a duplicate of
    /// a still-live key is a caller contract violation and replaces the
    /// previous entry.
    pub(crate) fn register(&self, message: Message) -> (Arc<Task>, mpsc::Receiver<TaskResult>) {
        let (task, results_rx) = Task::new(&self.cancel, message);
        let task = Arc::new(task);

        let task_key = task.message().task_key.clone();
        {
            // Counter updated under the map guard so it always equals the
            // map size.
            let mut tasks = self.tasks.lock();
            tasks.insert(task_key, task.clone());
            self.live.fetch_add(1, Ordering::SeqCst);
        }

        (task, results_rx)
    }

    /// Forward one task result into the flow's shared outbound channel.
    ///
    /// Dropped when the task is no longer live (already cancelled or
    /// evicted). The forward is a blocking hand-off: with the default
    /// capacity it only completes once a `wait` call is receiving, unless
    /// the flow's scope ends first.
    pub(crate) async fn relay(&self, result: TaskResult) {
        let live = self.tasks.lock().contains_key(&result.task_key);
        if !live {
            trace!(task_key = %result.task_key, "result dropped, task no longer live");
            return;
        }

        let task_key = result.task_key.clone();
        tokio::select! {
            // Cancellation checked first so a racing `cancel_all` always
            // wins over a ready receiver.
            biased;
            _ = self.cancel.cancelled() => {
                trace!(task_key = %task_key, "result dropped, flow cancelled");
            }
            sent = self.results_tx.send(result) => {
                if sent.is_err() {
                    trace!("result dropped, outbound channel closed");
                }
            }
        }
    }

    /// Cancel and evict one task. Silent no-op when the key is absent
    /// (already finished or never existed); absence is never an error.
    pub(crate) fn cancel_one(&self, task_key: &str) {
        let removed = {
            let mut tasks = self.tasks.lock();
            let removed = tasks.remove(task_key);
            if removed.is_some() {
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
            removed
        };

        if let Some(task) = removed {
            task.cancel();
            debug!(task_key, "task cancelled and evicted");
        }
    }

    /// Cancel every live task and reset the group. Safe to call repeatedly
    /// and concurrently with `relay`.
    pub(crate) fn cancel_all(&self) {
        let drained: Vec<Arc<Task>> = {
            let mut tasks = self.tasks.lock();
            let drained = tasks.drain().map(|(_, task)| task).collect();
            self.live.store(0, Ordering::SeqCst);
            drained
        };

        for task in &drained {
            task.cancel();
        }

        if !drained.is_empty() {
            debug!(count = drained.len(), "task group cancelled");
        }
    }

    /// Number of live tasks, readable lock-free.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Receive the next available result from the shared outbound channel.
    ///
    /// Used by `wait`; concurrent waiters queue on the receiver lock and
    /// each observed result is delivered to exactly one of them.
    pub(crate) async fn recv(&self) -> Option<TaskResult> {
        self.results_rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::Method;
    use std::time::Duration;

    fn group() -> TaskGroup {
        TaskGroup::new(CancellationToken::new(), 1)
    }

    fn message(task_key: &str) -> Message {
        Message {
            flow_key: "f1".to_string(),
            method: Method(1),
            task_key: task_key.to_string(),
            payload: String::new(),
        }
    }

    #[tokio::test]
    async fn test_register_tracks_live_count() {
        let group = group();
        assert_eq!(group.live_count(), 0);

        let (_t1, _rx1) = group.register(message("t1"));
        let (_t2, _rx2) = group.register(message("t2"));
        assert_eq!(group.live_count(), 2);

        group.cancel_one("t1");
        assert_eq!(group.live_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_one_absent_is_noop() {
        let group = group();
        group.cancel_one("missing");
        assert_eq!(group.live_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_one_cancels_task() {
        let group = group();
        let (task, _rx) = group.register(message("t1"));

        group.cancel_one("t1");
        assert!(task.is_cancelled());
        assert_eq!(group.live_count(), 0);
    }

    #[tokio::test]
    async fn test_relay_drops_result_for_evicted_task() {
        let group = group();
        let (task, _rx) = group.register(message("t1"));
        let result = TaskResult::success(task.message(), "late", 0);

        group.cancel_one("t1");

        // Nobody is receiving; a live task would block here.
        tokio::time::timeout(Duration::from_millis(100), group.relay(result))
            .await
            .expect("relay of an evicted task's result must return immediately");
    }

    #[tokio::test]
    async fn test_relay_hands_off_to_receiver() {
        let group = Arc::new(group());
        let (task, _rx) = group.register(message("t1"));
        let result = TaskResult::success(task.message(), "ok", 0);

        let forwarder = {
            let group = group.clone();
            let result = result.clone();
            tokio::spawn(async move { group.relay(result).await })
        };

        let received = group.recv().await.unwrap();
        assert_eq!(received, result);
        forwarder.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_all_clears_and_cancels() {
        let group = group();
        let (t1, _rx1) = group.register(message("t1"));
        let (t2, _rx2) = group.register(message("t2"));

        group.cancel_all();
        group.cancel_all(); // idempotent

        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
        assert_eq!(group.live_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_register_and_evict_keep_count_consistent() {
        let group = Arc::new(group());

        let mut workers = Vec::new();
        for worker in 0..4 {
            let group = group.clone();
            workers.push(tokio::spawn(async move {
                for i in 0..25 {
                    let (_task, _rx) = group.register(message(&format!("w{worker}-t{i}")));
                }
            }));
        }
        for worker in workers {
            worker.await.unwrap();
        }
        assert_eq!(group.live_count(), 100);

        let mut evictors = Vec::new();
        for worker in 0..4 {
            let group = group.clone();
            evictors.push(tokio::spawn(async move {
                for i in 0..25 {
                    group.cancel_one(&format!("w{worker}-t{i}"));
                    // Absent keys racing real evictions must not skew the
                    // counter.
                    group.cancel_one(&format!("w{worker}-t{i}"));
                }
            }));
        }
        for worker in evictors {
            worker.await.unwrap();
        }
        assert_eq!(group.live_count(), 0);

        group.cancel_all();
        assert_eq!(group.live_count(), 0);
    }

    #[tokio::test]
    async fn test_relay_racing_cancel_all_returns() {
        let cancel = CancellationToken::new();
        let group = Arc::new(TaskGroup::new(cancel.clone(), 1));
        let (task, _rx) = group.register(message("t1"));
        let result = TaskResult::success(task.message(), "racing", 0);

        // No waiter: the forward parks until the scope is cancelled.
        let forwarder = {
            let group = group.clone();
            tokio::spawn(async move { group.relay(result).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        group.cancel_all();

        tokio::time::timeout(Duration::from_millis(100), forwarder)
            .await
            .expect("relay must unblock on group cancellation")
            .unwrap();
    }
}
