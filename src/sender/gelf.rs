//! GELF 1.1 encoding: JSON document, optional gzip, chunking.

use clap::ValueEnum;
use flate2::{Compression as GzLevel, write::GzEncoder};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::Write;

use super::transport::TransportError;
use crate::domain::FlatMessage;

/// Chunk size that fits a typical 1500 byte MTU with IP/UDP headers.
pub const DEFAULT_CHUNK_SIZE: usize = 1420;
pub const MIN_CHUNK_SIZE: usize = 512;
/// Largest UDP payload over IPv4.
pub const MAX_CHUNK_SIZE: usize = 65_507;
/// Graylog discards messages split into more chunks than this.
pub const MAX_CHUNKS: usize = 128;

pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
pub const CHUNK_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    #[default]
    Gzip,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => f.write_str("none"),
            Compression::Gzip => f.write_str("gzip"),
        }
    }
}

/// Serializes a [`FlatMessage`] as a GELF JSON object, writing every extra
/// field with the `_` prefix GELF requires.
pub struct GelfDocument<'a>(pub &'a FlatMessage);

impl Serialize for GelfDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let message = self.0;
        let optional = usize::from(message.full_message.is_some())
            + usize::from(message.facility.is_some());
        let mut map = serializer.serialize_map(Some(5 + optional + message.extra.len()))?;

        map.serialize_entry("version", message.version)?;
        map.serialize_entry("host", &message.host)?;
        map.serialize_entry("short_message", &message.short_message)?;
        if let Some(full_message) = &message.full_message {
            map.serialize_entry("full_message", full_message)?;
        }
        map.serialize_entry("timestamp", &message.timestamp)?;
        map.serialize_entry("level", &message.level.as_u8())?;
        if let Some(facility) = &message.facility {
            map.serialize_entry("facility", facility)?;
        }
        for (key, value) in &message.extra {
            map.serialize_entry(&format!("_{key}"), value)?;
        }
        map.end()
    }
}

/// Turns messages into ready-to-send datagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GelfEncoder {
    compression: Compression,
    chunk_size: usize,
}

impl Default for GelfEncoder {
    fn default() -> Self {
        Self::new(Compression::default(), DEFAULT_CHUNK_SIZE)
    }
}

impl GelfEncoder {
    /// `chunk_size` is clamped to `MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE`.
    pub fn new(compression: Compression, chunk_size: usize) -> Self {
        Self {
            compression,
            chunk_size: chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE),
        }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Encode one message into one or more datagrams.
    pub fn encode(&self, message: &FlatMessage) -> Result<Vec<Vec<u8>>, TransportError> {
        let payload = self.payload(message)?;
        self.chunk(payload, rand::random::<[u8; 8]>())
    }

    /// JSON document, compressed according to the configured compression.
    pub fn payload(&self, message: &FlatMessage) -> Result<Vec<u8>, TransportError> {
        let json = to_json(message)?;
        match self.compression {
            Compression::None => Ok(json),
            Compression::Gzip => gzip(&json),
        }
    }

    /// Split `payload` into GELF chunks tagged with `message_id`.
    ///
    /// Payloads that fit in one datagram are returned unchanged.
    pub fn chunk(
        &self,
        payload: Vec<u8>,
        message_id: [u8; 8],
    ) -> Result<Vec<Vec<u8>>, TransportError> {
        if payload.len() <= self.chunk_size {
            return Ok(vec![payload]);
        }

        let body_len = self.chunk_size - CHUNK_HEADER_LEN;
        let count = payload.len().div_ceil(body_len);
        if count > MAX_CHUNKS {
            return Err(TransportError::TooManyChunks {
                chunks: count,
                max: MAX_CHUNKS,
            });
        }

        Ok(payload
            .chunks(body_len)
            .enumerate()
            .map(|(sequence, body)| {
                let mut datagram = Vec::with_capacity(CHUNK_HEADER_LEN + body.len());
                datagram.extend_from_slice(&CHUNK_MAGIC);
                datagram.extend_from_slice(&message_id);
                datagram.push(sequence as u8);
                datagram.push(count as u8);
                datagram.extend_from_slice(body);
                datagram
            })
            .collect())
    }
}

pub fn to_json(message: &FlatMessage) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(&GelfDocument(message)).map_err(TransportError::Encode)
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), GzLevel::fast());
    encoder.write_all(data).map_err(TransportError::Compress)?;
    encoder.finish().map_err(TransportError::Compress)
}
