//! File logging via tracing. Stdout belongs to the terminal UI.

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter, e.g. `LOKITYPE_LOG=debug`.
pub const LOG_ENV: &str = "LOKITYPE_LOG";

/// Install a daily-rolling file subscriber under the platform data directory.
pub fn init() -> std::io::Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "lokitype.log");

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("lokitype=info,warn"));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init();

    if installed.is_ok() {
        tracing::info!(log_dir = %log_dir.display(), "lokitype starting");
    }

    Ok(log_dir)
}

pub fn log_directory() -> PathBuf {
    ProjectDirs::from("", "", "lokitype")
        .map(|pd| pd.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}
