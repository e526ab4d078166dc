//! Optional `tracing` subscriber setup for hosts that have none.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Subscriber configuration.
///
/// `env_filter` uses the `EnvFilter` directive syntax (e.g. "info",
/// "brackets_reactive=debug,brackets_compiler=warn"). When unset, `RUST_LOG`
/// is consulted, then `warn`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    /// Print the event target (module path) before each message.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            with_target: false,
        }
    }
}

static INIT: Once = Once::new();

/// Install a global `fmt` subscriber once.
///
/// Idempotent; later calls are ignored. If the host already installed a
/// global subscriber, that one is kept.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = match config.env_filter {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .try_init()
            .is_ok();

        tracing::debug!(installed, "logging initialized");
    });
}
