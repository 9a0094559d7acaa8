//! Built-in handler capabilities.
//!
//! Real work (database adapters, host integrations) lives outside the
//! engine behind the [`MessageHandler`] trait; the delay handler here is
//! the one capability the crate ships, used by embeddings and tests alike.
//!
//! [`MessageHandler`]: crate::registry::MessageHandler

pub mod sleep;

pub use sleep::{SleepHandler, SLEEP_METHOD};
