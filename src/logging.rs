// Structured logging setup.

use std::env;
use std::fs::{File, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Invalid LINIP_LOG_FORMAT `{0}` (expected 'json' or 'pretty')")]
    Format(String),

    #[error("Failed to open log file: {0}")]
    File(#[from] io::Error),

    #[error("Failed to initialize logging: {0}")]
    Init(String),
}

fn open_log_file(path: &str) -> Result<Mutex<File>, LoggingError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Mutex::new(file))
}

fn map_init_err<E: std::fmt::Display>(err: E) -> LoggingError {
    LoggingError::Init(err.to_string())
}

/// Enable structured logging.
///
/// When `level` is `None`, this reads `LINIP_TRACE` if set. If `LINIP_TRACE` is
/// unset, the default level is `off`. `LINIP_LOG_FORMAT` selects `pretty`
/// (default) or `json`, and `LINIP_LOG_FILE` adds a file sink. Returns true when
/// logging is initialized, false if a subscriber is already configured.
pub fn init_logging(level: Option<&str>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level_value = level
        .map(str::to_string)
        .or_else(|| env::var("LINIP_TRACE").ok())
        .unwrap_or_else(|| "off".to_string());

    let filter = if level_value.eq_ignore_ascii_case("off") {
        EnvFilter::default().add_directive(LevelFilter::OFF.into())
    } else {
        EnvFilter::try_new(&level_value).map_err(|err| LoggingError::Filter(err.to_string()))?
    };

    let format = env::var("LINIP_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let log_file = env::var("LINIP_LOG_FILE").ok();
    let use_json = format.eq_ignore_ascii_case("json");

    if !use_json && !format.eq_ignore_ascii_case("pretty") {
        return Err(LoggingError::Format(format));
    }

    if use_json {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json();
        let base = tracing_subscriber::registry().with(filter).with(stderr_layer);
        if let Some(path) = log_file {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .json();
            base.with(file_layer).try_init().map_err(map_init_err)?;
        } else {
            base.try_init().map_err(map_init_err)?;
        }
    } else {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .pretty();
        let base = tracing_subscriber::registry().with(filter).with(stderr_layer);
        if let Some(path) = log_file {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .pretty();
            base.with(file_layer).try_init().map_err(map_init_err)?;
        } else {
            base.try_init().map_err(map_init_err)?;
        }
    }

    Ok(true)
}
