//! Logging setup.
//!
//! Console output always; a daily rolling file in addition when a log
//! directory is configured. Timestamps use the local timezone. The filter
//! comes from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].

use std::path::Path;

use chrono::{Local, Utc};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::utils::fs;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "job_herald=info,reqwest=warn";

/// Log retention period in days.
pub const LOG_RETENTION_DAYS: i64 = 7;

/// Prefix of rolled log file names (`job-herald.log.YYYY-MM-DD`).
const LOG_FILE_PREFIX: &str = "job-herald.log";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Initialize the global subscriber.
///
/// Returns the file writer guard when `log_dir` is set; keep it alive for the
/// lifetime of the process so buffered lines are flushed on exit.
pub fn init_logging(log_dir: Option<&Path>) -> crate::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console = fmt::layer().with_ansi(true).with_timer(LocalTimer);

    let Some(log_dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()
            .map_err(|e| {
                crate::Error::config(format!("Failed to set global default subscriber: {}", e))
            })?;
        return Ok(None);
    };

    fs::ensure_dir_all_sync_with_op("creating log directory", log_dir)?;

    // Create file appender with daily rotation
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTimer),
        )
        .try_init()
        .map_err(|e| {
            crate::Error::config(format!("Failed to set global default subscriber: {}", e))
        })?;

    Ok(Some(guard))
}

/// Delete rolled log files older than `retention_days`.
///
/// Returns how many files were removed. Files that do not follow the rolled
/// naming scheme are left alone.
pub async fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> std::io::Result<usize> {
    let cutoff = Utc::now() - chrono::Duration::days(retention_days);
    let cutoff_ts = cutoff.timestamp();

    let mut entries = tokio::fs::read_dir(log_dir).await?;
    let mut deleted_count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Extract date from filename (job-herald.log.YYYY-MM-DD)
        let Some(date_str) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|name| name.strip_prefix(LOG_FILE_PREFIX))
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            continue;
        };

        let Ok(file_date) = chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            continue;
        };
        let file_ts = file_date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        if file_ts < cutoff_ts {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to delete old log file");
            } else {
                deleted_count += 1;
                debug!(path = %path.display(), "Deleted old log file");
            }
        }
    }

    if deleted_count > 0 {
        info!(count = deleted_count, "Cleaned up old log files");
    }

    Ok(deleted_count)
}
