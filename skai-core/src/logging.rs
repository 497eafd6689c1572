//! Logging for the skai binaries.
//!
//! Each binary writes its own daily-rotated file under
//! `$XDG_STATE_HOME/skai/` (e.g. `skai.2024-08-20.log`,
//! `skai-demo.2024-08-20.log`). The terminal dashboard owns stdout, so
//! console output is opt-in and goes to stderr.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};

/// Where a binary's logs go.
#[derive(Debug, Clone, Copy)]
pub struct LogTarget<'a> {
    /// File name prefix, normally the binary name
    pub component: &'a str,
    /// Also echo warnings and errors to stderr
    pub stderr: bool,
}

impl<'a> LogTarget<'a> {
    pub fn file_only(component: &'a str) -> Self {
        Self {
            component,
            stderr: false,
        }
    }
}

/// Install the global subscriber.
///
/// The level comes from `RUST_LOG` when set, otherwise from the config.
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes buffered lines.
pub fn init(config: &LoggingConfig, target: LogTarget<'_>) -> Result<LoggingGuard> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(target.component)
        .filename_suffix("log")
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Logging(e.to_string()))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let stderr_layer = target.stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(tracing_subscriber::filter::LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::info!(
        component = target.component,
        log_dir = %log_dir.display(),
        level = %config.level,
        max_files = config.max_files,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Flushes pending log writes when dropped.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Directory holding all rotated log files.
pub fn log_dir() -> PathBuf {
    Config::state_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_is_under_state_dir() {
        assert!(log_dir().ends_with("skai"));
    }

    #[test]
    fn test_file_only_target() {
        let target = LogTarget::file_only("skai-demo");
        assert_eq!(target.component, "skai-demo");
        assert!(!target.stderr);
    }
}
