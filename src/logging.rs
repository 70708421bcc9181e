//! Structured logging initialization.
//!
//! The library itself only emits `tracing` events. Binaries (and embedders
//! that have no subscriber of their own) call [`init`] once at startup. The
//! RUST_LOG environment variable takes precedence over the configured level.

use crate::config::{LogFormat, LoggingConfig};
use tracing::Subscriber;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the global subscriber.
///
/// Does nothing if a global subscriber is already installed.
///
/// # Example
///
/// ```ignore
/// use dbufio::config::LoggingConfig;
/// use dbufio::logging;
///
/// logging::init(&LoggingConfig::default());
/// tracing::info!("scan starting");
/// ```
pub fn init(config: &LoggingConfig) {
    if try_init(config).is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

/// Install the global subscriber, failing if one is already installed.
pub fn try_init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.as_str())
    };

    tracing_subscriber::registry()
        .with(format_layer(config))
        .with(filter)
        .try_init()
}

fn format_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = fmt::layer()
        .with_target(config.target)
        .with_thread_names(config.thread_names);

    match (config.format, config.timestamps) {
        (LogFormat::Pretty, true) => base.with_ansi(true).boxed(),
        (LogFormat::Pretty, false) => base.with_ansi(true).without_time().boxed(),
        (LogFormat::Json, true) => base.json().boxed(),
        (LogFormat::Json, false) => base.json().without_time().boxed(),
        (LogFormat::Compact, true) => base.compact().with_ansi(true).boxed(),
        (LogFormat::Compact, false) => base.compact().with_ansi(true).without_time().boxed(),
    }
}
