use anyhow::{Context, Result};
use std::{fs, path::Path};
use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt, fmt::writer::MakeWriterExt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Install the global subscriber: everything at `RUST_LOG` (default `info`)
/// appended to `<log_dir>/<stage>.log`, warnings and errors echoed to stderr.
///
/// The returned guard must live until the process exits, otherwise buffered
/// lines are lost.
pub fn init_file_logging(log_dir: &Path, stage: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    // Rotation::NEVER opens the file in append mode and never renames it.
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(stage)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("opening {stage}.log in {}", log_dir.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env)
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr.with_max_level(Level::WARN))
                .with_target(false),
        )
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}
