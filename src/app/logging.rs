use super::config::{LogFormat, LogLevel};
use crate::domain::ExporterError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Dependencies that are too chatty at the exporter's own level.
const QUIET_TARGETS: &[&str] = &["hyper", "h2", "tower", "axum"];

fn level_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

/// Default level first, then one `target=warn` directive per quiet target.
pub fn build_filter_string(level: LogLevel) -> String {
    let mut parts = Vec::with_capacity(QUIET_TARGETS.len() + 1);
    parts.push(level_str(level).to_string());
    parts.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
    parts.join(",")
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG`, when set, replaces the directives built from `level`.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> Result<(), ExporterError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(_) => EnvFilter::try_from_default_env().map_err(|e| e.to_string()),
        Err(_) => EnvFilter::try_new(build_filter_string(level)).map_err(|e| e.to_string()),
    }
    .map_err(|e| ExporterError::Logging(format!("Invalid log filter: {e}")))?;

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).compact())
            .try_init(),
    };

    result.map_err(|e| ExporterError::Logging(e.to_string()))
}
