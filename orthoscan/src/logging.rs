//! Logging setup.
//!
//! Console output goes to stdout. When a log file is given, the same events
//! are also written there through a non-blocking writer; the returned
//! [`WorkerGuard`] must be held until the process exits or buffered lines
//! are lost.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Enables debug output for this crate.
    pub verbose: bool,
    /// Optional file receiving a copy of every log line.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log file path: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("Failed to create log directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Logging already initialised: {0}")]
    AlreadyInitialised(String),
}

/// Filter used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "info,orthoscan=debug"
    } else {
        "info"
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `options.verbose`.
pub fn init_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbose)));

    let console = fmt::layer().with_target(false).with_writer(io::stdout);

    match &options.log_file {
        Some(path) => {
            let (directory, file_name) = split_log_path(path)?;
            fs::create_dir_all(&directory).map_err(|source| LoggingError::CreateDir {
                path: directory.clone(),
                source,
            })?;

            let appender = tracing_appender::rolling::never(&directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer().with_ansi(false).with_writer(writer);

            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialised(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialised(e.to_string()))?;
            Ok(None)
        }
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String), LoggingError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, file_name.to_string()))
}
