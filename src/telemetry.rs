//! Tracing subscriber setup for host processes.

use crate::config::Config;
use crate::error::{GraphError, GraphResult};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Fails if a global
/// subscriber is already installed; the installed one stays in place.
pub fn init_tracing(config: &Config) -> GraphResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let result = if config.json_logs {
        subscriber.with(fmt::layer().json()).try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .try_init()
    };

    result.map_err(|e| GraphError::config(format!("Failed to install tracing subscriber: {e}")))
}
