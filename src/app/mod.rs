pub mod config;
pub mod exporter;
pub mod logging;
pub mod receiver;
pub mod server;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use exporter::{GelfExporter, PushSummary};
pub use logging::init_tracing;
pub use receiver::{ReceiverState, receiver_routes};

use clap::Parser;
use std::process;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct App {
    config: Config,
    exporter: Arc<GelfExporter>,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args_and_env(args)?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        init_tracing(config.log_level, config.log_format)?;

        info!("Starting gelf-udp-exporter v{}", crate::VERSION);
        info!(
            endpoint = %config.endpoint,
            strategy = %config.endpoint_refresh_strategy,
            compression = %config.compression,
            chunk_size = config.chunk_size,
            "Configuration loaded"
        );

        let exporter = Arc::new(GelfExporter::from_config(&config)?);
        Ok(Self { config, exporter })
    }

    pub fn exporter(&self) -> &Arc<GelfExporter> {
        &self.exporter
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.exporter.start().await?;

        let shutdown = CancellationToken::new();
        let app = receiver_routes(ReceiverState {
            exporter: Arc::clone(&self.exporter),
            shutdown: shutdown.clone(),
        });

        server::serve(app, &self.config.listen_address, shutdown).await?;

        let stats = self.exporter.stats();
        info!(
            sent = stats.messages_sent,
            failed = stats.messages_failed,
            bytes = stats.bytes_sent,
            "gelf-udp-exporter stopped"
        );
        Ok(())
    }
}

// Main entry point for the application
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();

    // Handle help flag
    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        Config::parse_from(["gelf-udp-exporter", "--help"]);
        return Ok(());
    }

    match App::from_args(args) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            // Tracing may not be up yet when configuration fails
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    }

    Ok(())
}
