#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Taskflow Core
//!
//! Embeddable task-dispatch engine: callers submit typed work items
//! ([`Message`]) tagged with a logical flow key and a unique task key; the
//! engine runs the matching handler concurrently, multiplexes
//! possibly-multiple partial results per task into a per-flow result
//! stream, and lets callers cancel an individual task, tear down an entire
//! flow, or wait with a timeout for the next available result.
//!
//! ## Architecture
//!
//! Ownership runs strictly downward and cancellation with it:
//!
//! ```text
//! Dispatcher ─ root scope
//!   └── FlowRegistry
//!         └── Flow ─ per-flow scope, shared result channel
//!               └── TaskGroup
//!                     └── Task ─ per-task scope, private result channel
//! ```
//!
//! There is no central scheduler: each pushed message spawns its handler
//! invocation plus a supervising relay that forwards the task's private
//! results into the flow's shared channel and evicts the task on completion
//! or cancellation. Hand-off is rendezvous-style, so at most one undelivered
//! result per flow is in flight and producers get natural backpressure.
//!
//! ## Module Organization
//!
//! - [`engine`] - Dispatcher, Flow, TaskGroup and Task lifecycle machinery
//! - [`registry`] - method-code dispatch to [`MessageHandler`] capabilities
//! - [`messaging`] - message/result value types and wire serialization
//! - [`handlers`] - built-in delay handler
//! - [`error`] - structured error handling
//! - [`config`] - dispatcher configuration
//! - [`logging`] - structured tracing initialization
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use taskflow_core::handlers::{SleepHandler, SLEEP_METHOD};
//! use taskflow_core::{Dispatcher, HandlerRegistry, Message};
//!
//! # tokio_test::block_on(async {
//! let mut registry = HandlerRegistry::new();
//! registry.register(SLEEP_METHOD, Arc::new(SleepHandler::new()));
//!
//! let dispatcher = Dispatcher::new(registry);
//!
//! dispatcher.push(Message {
//!     flow_key: "reports".to_string(),
//!     method: SLEEP_METHOD,
//!     task_key: "t1".to_string(),
//!     payload: r#"{"duration": 50}"#.to_string(),
//! }).unwrap();
//!
//! let result = dispatcher.wait("reports", 5000).await.unwrap();
//! assert!(result.contains(r#""tk":"t1""#));
//! # });
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod messaging;
pub mod registry;

pub use config::DispatcherConfig;
pub use engine::{Dispatcher, Task};
pub use error::{DispatchError, Result};
pub use messaging::{Message, Method, Outcome, TaskResult, WireResult};
pub use registry::{HandlerRegistry, MessageHandler};
