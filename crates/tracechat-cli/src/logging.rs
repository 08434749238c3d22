//! Log setup: a daily rolling file so output never interleaves with the REPL.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use tracechat_infrastructure::TraceChatPaths;

const DEFAULT_FILTER: &str =
    "tracechat=info,tracechat_core=info,tracechat_infrastructure=info,tracechat_application=info";

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init() -> Result<WorkerGuard> {
    let log_dir = TraceChatPaths::log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "tracechat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("[tracechat] logging to {}", log_dir.display());
    Ok(guard)
}
