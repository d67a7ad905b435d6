//! File-backed tracing setup.
//!
//! The TUI owns stderr, so log output goes to
//! `<data_local_dir>/ask-chat/ask-chat.log`. The filter is read from
//! `ASK_CHAT_LOG` (e.g. `ASK_CHAT_LOG=debug`) and defaults to `info`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "ASK_CHAT_LOG";
const LOG_FILE_NAME: &str = "ask-chat.log";

/// Initialize logging. The returned guard flushes the log file when dropped
/// and must be held for the life of the program.
pub fn init() -> Result<WorkerGuard> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}

pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine local data directory"))?;
    Ok(data_dir.join("ask-chat"))
}

pub fn log_path() -> Result<PathBuf> {
    Ok(log_dir()?.join(LOG_FILE_NAME))
}
