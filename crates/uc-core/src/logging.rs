//! Logging bring-up from the bound log configuration.
//!
//! The bound level becomes the tracing level filter. The standard-library
//! backend writes to stderr. `RUST_LOG`, when set, takes precedence.

use thiserror::Error;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uc_config::{LogBackend, LogBinding, LogLevel};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Tracing filter for a bound log level.
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warning => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::None => LevelFilter::OFF,
    }
}

fn env_filter(default: LevelFilter) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default.into()))
}

/// Install the global subscriber for `binding`.
pub fn init(binding: &LogBinding, json: bool) -> Result<(), LoggingError> {
    init_with_filter(level_filter(binding.level), binding.backend, json)
}

/// Install the global subscriber with an explicit default level.
pub fn init_with_filter(
    default: LevelFilter,
    backend: LogBackend,
    json: bool,
) -> Result<(), LoggingError> {
    let writer = match backend {
        LogBackend::StandardLibrary => std::io::stderr,
    };
    let filter = env_filter(default);

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
    });
    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

/// Emits `enter` on creation and `exit` on drop when the binding enables
/// enter/exit tracing.
#[must_use = "the exit event is emitted when the guard is dropped"]
pub struct EnterExitGuard {
    function: &'static str,
    enabled: bool,
}

impl EnterExitGuard {
    pub fn enter(binding: &LogBinding, function: &'static str) -> Self {
        let enabled = binding.trace_enter_exit && binding.level == LogLevel::Debug;
        if enabled {
            debug!(function, "enter");
        }
        Self { function, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for EnterExitGuard {
    fn drop(&mut self) {
        if self.enabled {
            debug!(function = self.function, "exit");
        }
    }
}
