use crate::app::config::ConfigError;
use crate::endpoint::ResolutionError;
use crate::sender::DispatchError;
use thiserror::Error;

/// Top-level error type for the exporter.
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Endpoint resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Logging initialization failed: {0}")]
    Logging(String),

    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

impl ExporterError {
    /// True when the push was withdrawn by its caller rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExporterError::Dispatch(DispatchError::Cancelled { .. }))
    }
}
