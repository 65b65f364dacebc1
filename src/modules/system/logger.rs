use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::get_data_dir;

const LOG_FILE_PREFIX: &str = "autovote.log";
const LOG_RETENTION_DAYS: u64 = 7;

struct LocalTimer;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        write!(w, "{}", now.to_rfc3339())
    }
}

pub fn get_log_dir() -> Result<PathBuf, String> {
    let log_dir = get_data_dir()?.join("logs");
    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;
    }
    Ok(log_dir)
}

/// Console + daily-rotated file logging. Keep the returned guard alive for
/// the whole process or buffered file lines are lost on exit.
pub fn init_logger() -> Option<WorkerGuard> {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_timer(LocalTimer);

    let log_dir = match get_log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to initialize log directory: {}", e);
            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(console_layer)
                .try_init();
            return None;
        }
    };

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::Layer::new()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(LocalTimer);
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    info!("Log system initialized (Console + File persistence)");
    match cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
        Ok(0) => {}
        Ok(n) => info!("Deleted {} expired log files", n),
        Err(e) => warn!("Failed to cleanup old logs: {}", e),
    }
    Some(guard)
}

/// Removes regular files in `log_dir` not modified within `days_to_keep`.
pub fn cleanup_old_logs(log_dir: &Path, days_to_keep: u64) -> Result<usize, String> {
    if !log_dir.exists() {
        return Ok(0);
    }
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(days_to_keep * 24 * 60 * 60))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let entries =
        fs::read_dir(log_dir).map_err(|e| format!("Failed to read log directory: {}", e))?;
    let mut deleted = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
            continue;
        };
        if modified < cutoff {
            match fs::remove_file(&path) {
                Ok(()) => deleted += 1,
                Err(e) => warn!("Failed to delete old log file {:?}: {}", path, e),
            }
        }
    }
    Ok(deleted)
}
