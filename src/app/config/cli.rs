use super::env;
use super::{ConfigError, LogFormat, LogLevel};
use crate::endpoint::RefreshStrategy;
use crate::endpoint::strategy::{STRATEGY_INTERVAL, STRATEGY_NONE, STRATEGY_PER_BATCH};
use crate::sender::Compression;
use crate::sender::gelf::DEFAULT_CHUNK_SIZE;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding a whole TOML configuration document.
pub const CONFIG_ENV: &str = "GELF_EXPORTER_CONFIG";

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:4318";

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Graylog GELF UDP endpoint (host:port)
    #[arg(long, env = "GELF_ENDPOINT", default_value = "")]
    pub endpoint: String,

    /// When to re-resolve the endpoint: none, perbatch or interval
    #[arg(long, env = "GELF_ENDPOINT_REFRESH_STRATEGY", default_value = "none")]
    pub endpoint_refresh_strategy: String,

    /// Seconds between re-resolutions (interval strategy only)
    #[arg(long, env = "GELF_ENDPOINT_REFRESH_INTERVAL_SECS", default_value = "60")]
    pub endpoint_refresh_interval_secs: u64,

    /// Payload compression
    #[arg(long, env = "GELF_COMPRESSION", default_value = "gzip")]
    pub compression: Compression,

    /// Maximum datagram size before GELF chunking kicks in
    #[arg(long, env = "GELF_CHUNK_SIZE", default_value = "1420")]
    pub chunk_size: usize,

    /// Facility written into every message
    #[arg(long, env = "GELF_FACILITY")]
    pub facility: Option<String>,

    /// Address of the OTLP/HTTP receiver
    #[arg(long, env = "OTLP_LISTEN_ADDRESS", default_value = "0.0.0.0:4318")]
    pub listen_address: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub endpoint_refresh_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            endpoint_refresh_strategy: STRATEGY_NONE.to_string(),
            endpoint_refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            compression: Compression::Gzip,
            chunk_size: DEFAULT_CHUNK_SIZE,
            facility: None,
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Json,
            config_file: None,
            endpoint_refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        // A whole TOML document wins over individual variables
        if let Some(document) = env::var(CONFIG_ENV) {
            return Self::from_toml_str(&document);
        }

        let mut config = Config::default();

        env::override_text("GELF_ENDPOINT", &mut config.endpoint);
        env::override_text("GELF_ENDPOINT_REFRESH_STRATEGY", &mut config.endpoint_refresh_strategy);
        env::override_parsed(
            "GELF_ENDPOINT_REFRESH_INTERVAL_SECS",
            &mut config.endpoint_refresh_interval_secs,
        )?;
        env::override_enum("GELF_COMPRESSION", &mut config.compression)?;
        env::override_parsed("GELF_CHUNK_SIZE", &mut config.chunk_size)?;
        env::override_text("GELF_FACILITY", &mut config.facility);
        env::override_text("OTLP_LISTEN_ADDRESS", &mut config.listen_address);
        env::override_enum("LOG_LEVEL", &mut config.log_level)?;
        env::override_enum("LOG_FORMAT", &mut config.log_format)?;
        config.config_file = env::var("CONFIG_FILE").map(PathBuf::from);

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// CLI flags and their env vars, layered over a TOML base taken from
    /// `GELF_EXPORTER_CONFIG` or `--config-file`.
    pub fn from_args_and_env<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);

        let base = if let Some(document) = env::var(CONFIG_ENV) {
            Some(toml::from_str::<Config>(&document)?)
        } else if let Some(path) = &config.config_file {
            Some(toml::from_str::<Config>(&std::fs::read_to_string(path)?)?)
        } else {
            None
        };

        if let Some(base) = base {
            config.fill_defaults_from(base);
        }

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(document)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.endpoint = self.endpoint.trim().to_string();
        self.endpoint_refresh_strategy = self.endpoint_refresh_strategy.trim().to_lowercase();
        self.endpoint_refresh_interval = Duration::from_secs(self.endpoint_refresh_interval_secs);
        Ok(())
    }

    /// Parsed refresh strategy. An empty name means `none`.
    pub fn refresh_strategy(&self) -> Result<RefreshStrategy, ConfigError> {
        match self.endpoint_refresh_strategy.as_str() {
            "" | STRATEGY_NONE => Ok(RefreshStrategy::Static),
            STRATEGY_PER_BATCH => Ok(RefreshStrategy::PerBatch),
            STRATEGY_INTERVAL => Ok(RefreshStrategy::Interval(self.endpoint_refresh_interval)),
            other => Err(ConfigError::InvalidRefreshStrategy(other.to_string())),
        }
    }

    // Values left at their default take the base value instead.
    fn fill_defaults_from(&mut self, base: Config) {
        let defaults = Config::default();

        if self.endpoint == defaults.endpoint {
            self.endpoint = base.endpoint;
        }
        if self.endpoint_refresh_strategy == defaults.endpoint_refresh_strategy {
            self.endpoint_refresh_strategy = base.endpoint_refresh_strategy;
        }
        if self.endpoint_refresh_interval_secs == defaults.endpoint_refresh_interval_secs {
            self.endpoint_refresh_interval_secs = base.endpoint_refresh_interval_secs;
        }
        if self.compression == defaults.compression {
            self.compression = base.compression;
        }
        if self.chunk_size == defaults.chunk_size {
            self.chunk_size = base.chunk_size;
        }
        if self.facility.is_none() {
            self.facility = base.facility;
        }
        if self.listen_address == defaults.listen_address {
            self.listen_address = base.listen_address;
        }
        if self.log_level == defaults.log_level {
            self.log_level = base.log_level;
        }
        if self.log_format == defaults.log_format {
            self.log_format = base.log_format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_strategy_names() {
        let mut config = Config::default();
        for (name, expected) in [
            ("", RefreshStrategy::Static),
            ("none", RefreshStrategy::Static),
            ("perbatch", RefreshStrategy::PerBatch),
            ("interval", RefreshStrategy::Interval(Duration::from_secs(60))),
        ] {
            config.endpoint_refresh_strategy = name.to_string();
            assert_eq!(config.refresh_strategy().unwrap(), expected);
        }

        config.endpoint_refresh_strategy = "sometimes".to_string();
        let err = config.refresh_strategy().unwrap_err();
        assert_eq!(err.to_string(), "invalid endpoint refresh strategy: sometimes");
    }

    #[test]
    fn test_post_process_normalizes() {
        let mut config = Config {
            endpoint: " graylog:12201 ".to_string(),
            endpoint_refresh_strategy: "PerBatch".to_string(),
            endpoint_refresh_interval_secs: 15,
            ..Config::default()
        };
        config.post_process().unwrap();
        assert_eq!(config.endpoint, "graylog:12201");
        assert_eq!(config.endpoint_refresh_strategy, "perbatch");
        assert_eq!(config.endpoint_refresh_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_fill_defaults_keeps_explicit_values() {
        let mut config = Config {
            endpoint: "cli:12201".to_string(),
            ..Config::default()
        };
        let base = Config {
            endpoint: "file:12201".to_string(),
            chunk_size: 8192,
            facility: Some("otel".to_string()),
            ..Config::default()
        };
        config.fill_defaults_from(base);
        assert_eq!(config.endpoint, "cli:12201");
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.facility.as_deref(), Some("otel"));
    }
}
