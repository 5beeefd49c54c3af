//! Tracing setup: console output plus an optional rolling file sink

use crate::config::Settings;
use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log files kept before the oldest is removed
const MAX_LOG_FILES: usize = 5;

/// Install the global subscriber.
///
/// Console output is JSON in production and human-readable otherwise. When
/// `general.log_dir` is set, events are also written to a daily-rotated
/// `app.log` there. Keep the returned guard alive until exit so buffered
/// file output is flushed.
pub fn init(settings: &Settings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&settings.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let json = settings.is_production();

    let console = if json {
        fmt::layer().with_target(false).json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let (file, guard) = match settings.general.log_dir.as_deref() {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(dir)?);
            let layer = if json {
                fmt::layer().json().with_writer(writer).boxed()
            } else {
                fmt::layer().with_ansi(false).with_writer(writer).boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
    Ok(guard)
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("app")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("failed to open log file in {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_appender_creates_directory() {
        let dir = std::env::temp_dir()
            .join(format!("scrape-indexer-logs-{}", uuid::Uuid::new_v4()))
            .join("nested");

        let mut appender = file_appender(&dir).unwrap();
        appender.write_all(b"captured\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("app.") && names[0].ends_with(".log"), "{:?}", names);

        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }
}
