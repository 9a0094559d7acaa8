//! # Structured Logging Module
//!
//! Environment-aware structured logging for debugging concurrent flow and
//! task lifecycles. Verbosity is driven by the `TASKFLOW_LOG` environment
//! variable using the standard `EnvFilter` directive syntax.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Environment variable controlling the log filter, e.g.
/// `TASKFLOW_LOG=taskflow_core=debug`.
pub const LOG_ENV_VAR: &str = "TASKFLOW_LOG";

/// Initialize structured logging for the embedding process.
///
/// Safe to call more than once; only the first call installs a subscriber,
/// and installation is skipped quietly when the host already set one up.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_filter(filter),
            )
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
