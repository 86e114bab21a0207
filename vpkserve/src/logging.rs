//! Logging setup.
//!
//! Installs a global `tracing` subscriber with:
//!
//! - an `EnvFilter` read from `RUST_LOG`, falling back to the configured level
//! - a stderr layer with local RFC 3339 timestamps
//! - optionally, a non-blocking daily-rotated file layer
//!
//! The returned [`LoggingGuard`] must be held for the life of the process;
//! dropping it flushes and stops the file writer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Log file name prefix; the appender adds a date suffix.
const LOG_FILE_PREFIX: &str = "vpkserve.log";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("a global logger is already installed")]
    AlreadyInstalled,
}

/// Keeps the file writer alive.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Compute the filter directive for a configured level.
///
/// `verbose` raises the crate's own level to `debug` regardless of config.
pub fn filter_directive(level: &str, verbose: bool) -> String {
    if verbose {
        format!("{level},vpkserve=debug")
    } else {
        level.to_string()
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<LoggingGuard, LoggingError> {
    let directive = filter_directive(&config.level, verbose);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directive).map_err(|e| LoggingError::Filter {
            filter: directive.clone(),
            reason: e.to_string(),
        })?,
    };

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(LocalTime::new(Rfc3339));

    let (file_layer, file_guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTime::new(Rfc3339));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    Ok(LoggingGuard { _file: file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive("info", false), "info");
        assert_eq!(
            filter_directive("warn", true),
            "warn,vpkserve=debug"
        );
    }

    #[test]
    fn test_directives_parse() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(EnvFilter::try_new(filter_directive(level, true)).is_ok());
        }
    }
}
