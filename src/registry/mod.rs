//! # Handler Registry
//!
//! Maps a message's method code to the handler capability that processes it.
//! The table is populated at construction time and immutable afterwards;
//! unknown codes surface as a typed [`DispatchError::UnknownMethod`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::engine::Task;
use crate::error::{DispatchError, Result};
use crate::messaging::Method;

/// A handler capability: the narrow boundary through which external
/// collaborators perform the actual work of a task.
///
/// All output is communicated exclusively through [`Task::publish`], ending
/// with a terminal result (or none at all when cancelled externally).
/// Implementations must select on [`Task::cancelled`] and stop promptly;
/// the engine does not bound the reaction time of an uncooperative handler.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, task: Arc<Task>);
}

/// Lookup table from method code to handler capability.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Method, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `method`. Re-registering a code replaces the
    /// previous handler with a warning.
    pub fn register(&mut self, method: Method, handler: Arc<dyn MessageHandler>) {
        if self.handlers.insert(method, handler).is_some() {
            warn!(method = %method, "handler already registered, replacing");
        } else {
            info!(method = %method, "handler registered");
        }
    }

    /// Resolve the handler for `method`.
    pub fn resolve(&self, method: Method) -> Result<Arc<dyn MessageHandler>> {
        self.handlers
            .get(&method)
            .cloned()
            .ok_or(DispatchError::UnknownMethod { method })
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
