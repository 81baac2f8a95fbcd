use crate::error::ConfigError;
use crate::settings::{LogFormat, Logging};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// Console output goes to stderr so that exports written to stdout stay clean.
/// `RUST_LOG` wins over `verbose`. When a log directory is configured the
/// returned guard must be kept alive until exit, or buffered lines are lost.
pub fn init_logging(settings: &Logging, verbose: bool) -> Result<Option<WorkerGuard>, ConfigError> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match &settings.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &settings.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let result = match settings.format {
        LogFormat::Full => registry.with(console).try_init(),
        LogFormat::Compact => registry.with(console.compact()).try_init(),
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(guard)
}
