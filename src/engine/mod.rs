//! # Dispatch Engine
//!
//! The [`Dispatcher`] is the engine's root object: it owns the root
//! cancellation scope and the flow registry, and exposes the public
//! operation surface (`push`, `wait`, `cancel_task`, `stop_flow`,
//! `active_task_count`, `destroy`).
//!
//! ## Control flow
//!
//! `push` resolves the message's handler, materializes the target flow,
//! registers a task in the flow's group and spawns two concurrent
//! activities: the handler invocation itself and a supervising relay that
//! drains the task's private result channel into the flow's shared channel
//! until a terminal result or any enclosing cancellation. `wait` blocks on
//! the shared channel with a caller-supplied timeout. Cancellation is
//! hierarchical: destroying the dispatcher cancels every flow, stopping a
//! flow cancels every task under it.

mod flow;
mod flow_registry;
mod task;
mod task_group;

pub use flow::Flow;
pub use flow_registry::FlowRegistry;
pub use task::Task;
pub use task_group::TaskGroup;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, Result};
use crate::messaging::Message;
use crate::registry::HandlerRegistry;

/// Root state torn down and replaced wholesale by `destroy`.
struct DispatcherCore {
    root: CancellationToken,
    flows: FlowRegistry,
}

impl DispatcherCore {
    fn new(config: &DispatcherConfig) -> Self {
        Self {
            root: CancellationToken::new(),
            flows: FlowRegistry::new(config.channel_capacity()),
        }
    }
}

/// The task-dispatch engine.
///
/// Typically embedded as a process-wide singleton, but nothing requires it:
/// multiple dispatchers coexist with fully independent cancellation domains.
/// All operations take `&self`; the dispatcher is shared behind an `Arc` in
/// concurrent embeddings. `push`, `cancel_task` and `stop_flow` spawn onto
/// the ambient Tokio runtime and must be called from within one.
pub struct Dispatcher {
    handlers: Arc<HandlerRegistry>,
    config: DispatcherConfig,
    core: RwLock<Arc<DispatcherCore>>,
}

impl Dispatcher {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self::with_config(handlers, DispatcherConfig::default())
    }

    pub fn with_config(handlers: HandlerRegistry, config: DispatcherConfig) -> Self {
        let core = Arc::new(DispatcherCore::new(&config));

        Self {
            handlers: Arc::new(handlers),
            config,
            core: RwLock::new(core),
        }
    }

    fn core(&self) -> Arc<DispatcherCore> {
        self.core.read().clone()
    }

    /// Submit a message for execution.
    ///
    /// Success means "accepted", not "completed": the matching handler and
    /// its supervising relay are spawned and `push` returns immediately.
    /// An unregistered method code is rejected synchronously with no side
    /// effects.
    pub fn push(&self, message: Message) -> Result<()> {
        let handler = self.handlers.resolve(message.method)?;

        let core = self.core();
        let flow = core.flows.get_or_create(&core.root, &message.flow_key);

        let task_key = message.task_key.clone();
        let (task, mut results_rx) = flow.group().register(message);
        debug!(flow_key = %flow.key(), task_key = %task_key, "task accepted");

        let handler_task = Arc::clone(&task);
        tokio::spawn(async move {
            handler.handle(handler_task).await;
        });

        let root = core.root.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = root.cancelled() => break,
                    _ = flow.cancelled() => break,
                    _ = task.cancelled() => break,
                    received = results_rx.recv() => match received {
                        Some(result) => {
                            let has_next = result.outcome.has_next();
                            flow.group().relay(result).await;
                            if !has_next {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }

            // Idempotent with any cancellation-triggered eviction that
            // already happened.
            flow.group().cancel_one(&task_key);
        });

        Ok(())
    }

    /// Block until the flow's next result, a timeout, or cancellation.
    ///
    /// Returns the result serialized to its compact JSON wire shape. A
    /// result with `hn: true` means the task will publish more output and
    /// the caller should wait again. Timeouts never cancel the underlying
    /// task.
    pub async fn wait(&self, flow_key: &str, timeout_ms: i64) -> Result<String> {
        if timeout_ms <= 0 {
            return Err(DispatchError::InvalidTimeout { timeout_ms });
        }

        let core = self.core();
        let flow = core
            .flows
            .get(flow_key)
            .ok_or_else(|| DispatchError::FlowNotFound {
                flow_key: flow_key.to_string(),
            })?;

        tokio::select! {
            _ = core.root.cancelled() => Err(DispatchError::Destroyed),
            _ = flow.cancelled() => Err(DispatchError::FlowStopped {
                flow_key: flow_key.to_string(),
            }),
            _ = tokio::time::sleep(Duration::from_millis(timeout_ms as u64)) => {
                Err(DispatchError::WaitTimeout { timeout_ms })
            }
            received = flow.group().recv() => match received {
                Some(result) => result
                    .to_wire_json()
                    .map_err(|err| DispatchError::Serialization {
                        message: err.to_string(),
                    }),
                None => Err(DispatchError::ChannelClosed),
            }
        }
    }

    /// Cancel one task. Fire-and-forget: runs asynchronously and absence of
    /// the flow or task is silently ignored.
    pub fn cancel_task(&self, flow_key: &str, task_key: &str) {
        let core = self.core();
        let flow_key = flow_key.to_string();
        let task_key = task_key.to_string();

        tokio::spawn(async move {
            if let Some(flow) = core.flows.get(&flow_key) {
                flow.group().cancel_one(&task_key);
            }
        });
    }

    /// Stop a whole flow, cancelling all its tasks. Fire-and-forget; absence
    /// is silently ignored.
    pub fn stop_flow(&self, flow_key: &str) {
        let core = self.core();
        let flow_key = flow_key.to_string();

        tokio::spawn(async move {
            core.flows.delete(&flow_key);
        });
    }

    /// Current total of live tasks across all flows.
    pub fn active_task_count(&self) -> usize {
        self.core().flows.total_active_tasks()
    }

    /// Tear down all flows and reinitialize in place.
    ///
    /// Pending waits fail with [`DispatchError::Destroyed`]; subsequent
    /// calls see a fresh, empty registry immediately.
    pub fn destroy(&self) {
        let fresh = Arc::new(DispatcherCore::new(&self.config));
        let old = {
            let mut core = self.core.write();
            std::mem::replace(&mut *core, fresh)
        };

        old.root.cancel();
        old.flows.cancel_all();
        info!("dispatcher destroyed and reinitialized");
    }
}
