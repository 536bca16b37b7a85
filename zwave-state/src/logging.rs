//! Subscriber setup for bridge processes
//!
//! Call sites log through `tracing`; this module installs the global
//! subscriber. A bridge usually runs as a child of a home-automation host
//! that owns stdout, so every mode writes to stderr and nothing is installed
//! unless a mode is chosen.
//!
//! `ZWAVE_LOG_MODE` picks the mode (`silent`, `dev`, `debug`, `json`).
//! `ZWAVE_LOG_LEVEL`, then `RUST_LOG`, replaces the mode's default filter.

use std::str::FromStr;

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingMode {
    #[default]
    Silent,
    /// One compact line per event, node and value transitions at `info`
    Development,
    /// Every driver event and binding decision, with source locations
    Debug,
    /// Newline-delimited JSON for hosts that collect structured logs
    Json,
}

impl LoggingMode {
    /// Filter used when no environment override is set
    pub fn default_directive(self) -> &'static str {
        match self {
            LoggingMode::Silent => "off",
            LoggingMode::Development | LoggingMode::Json => "info",
            LoggingMode::Debug => "zwave_state=debug,zwave_bridge=debug,info",
        }
    }
}

impl FromStr for LoggingMode {
    type Err = LoggingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "silent" | "off" => Ok(LoggingMode::Silent),
            "development" | "dev" => Ok(LoggingMode::Development),
            "debug" => Ok(LoggingMode::Debug),
            "json" => Ok(LoggingMode::Json),
            other => Err(LoggingError::InvalidEnv(format!("ZWAVE_LOG_MODE={}", other))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid logging environment: {0}")]
    InvalidEnv(String),
}

/// Install the global subscriber for `mode`
///
/// Fails if a subscriber is already installed, or if the filter taken from
/// the environment does not parse.
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    if mode == LoggingMode::Silent {
        return Ok(());
    }
    let filter = create_env_filter(mode.default_directive())?;
    let registry = Registry::default().with(filter);

    let installed = match mode {
        LoggingMode::Silent => return Ok(()),
        LoggingMode::Development => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LoggingMode::Debug => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LoggingMode::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    installed.map_err(|e| LoggingError::TracingInit(e.to_string()))
}

/// Install the subscriber selected by `ZWAVE_LOG_MODE` (silent when unset)
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = std::env::var("ZWAVE_LOG_MODE")
        .map(|name| name.parse::<LoggingMode>())
        .unwrap_or(Ok(LoggingMode::Silent))?;

    init_logging(mode)
}

fn create_env_filter(default_directive: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var("ZWAVE_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_directive.to_string());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidEnv(format!("{}: {}", directives, e)))
}

/// Whether any global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

pub fn init_silent() -> Result<(), LoggingError> {
    init_logging(LoggingMode::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_installs_nothing() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
        assert!(init_silent().is_ok());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("debug".parse::<LoggingMode>().unwrap(), LoggingMode::Debug);
        assert_eq!("Dev".parse::<LoggingMode>().unwrap(), LoggingMode::Development);
        assert_eq!(" json ".parse::<LoggingMode>().unwrap(), LoggingMode::Json);
        assert_eq!("".parse::<LoggingMode>().unwrap(), LoggingMode::Silent);
        assert!(matches!("loud".parse::<LoggingMode>(), Err(LoggingError::InvalidEnv(_))));
    }

    #[test]
    fn test_default_directives_parse() {
        for mode in [LoggingMode::Development, LoggingMode::Debug, LoggingMode::Json] {
            assert!(EnvFilter::try_new(mode.default_directive()).is_ok());
        }
    }
}
