//! Tracing subscriber setup: a stderr layer and an optional plain-text file
//! layer, each with its own filter.

use anyhow::Context as _;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer as _;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::config::LoggingConfig;

/// Console filter directive for `-v` repeated `verbose` times.
#[must_use]
pub fn console_directive(base: &str, verbose: u8) -> &str {
    match verbose {
        0 => base,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` replaces the console filter when set. The returned guard must
/// be held until exit so buffered file lines are flushed.
///
/// # Errors
///
/// Fails on an unparseable level, an uncreatable log directory, or when a
/// global subscriber is already installed.
pub fn init(config: &LoggingConfig, verbose: u8) -> anyhow::Result<Option<WorkerGuard>> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(console_directive(&config.console_level, verbose))
            .with_context(|| format!("invalid console log level '{}'", config.console_level))?,
    };
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let (file, guard) = if config.file.trim().is_empty() {
        (None, None)
    } else {
        std::fs::create_dir_all(&config.dir).with_context(|| {
            format!("failed to create log directory {}", config.dir.display())
        })?;
        let file_filter = EnvFilter::try_new(&config.file_level)
            .with_context(|| format!("invalid file log level '{}'", config.file_level))?;
        let appender = tracing_appender::rolling::never(&config.dir, &config.file);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(file_filter);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
