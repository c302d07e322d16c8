use super::{Config, ConfigError};
use crate::endpoint::RefreshStrategy;
use crate::sender::gelf::{MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use std::net::SocketAddr;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        // host:port, IPv6 literals in brackets
        let port = self
            .endpoint
            .rsplit_once(':')
            .filter(|(host, _)| !host.is_empty())
            .and_then(|(_, port)| port.parse::<u16>().ok())
            .ok_or_else(|| {
                ConfigError::InvalidEndpoint(format!(
                    "'{}' is not of the form host:port",
                    self.endpoint
                ))
            })?;
        if port == 0 {
            return Err(ConfigError::InvalidEndpoint(format!(
                "'{}' must have a non-zero port",
                self.endpoint
            )));
        }

        if let RefreshStrategy::Interval(interval) = self.refresh_strategy()?
            && interval.is_zero()
        {
            return Err(ConfigError::InvalidConfig(
                "Endpoint refresh interval must be greater than 0".to_string(),
            ));
        }

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ConfigError::InvalidConfig(format!(
                "Chunk size ({}) must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}",
                self.chunk_size
            )));
        }

        self.listen_address.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidConfig(format!(
                "Invalid listen address '{}': {e}",
                self.listen_address
            ))
        })?;

        Ok(())
    }
}
