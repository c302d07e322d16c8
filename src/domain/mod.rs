//! Domain layer for gelf-udp-exporter.
//!
//! Contains the canonical types shared across all modules:
//! - `FlatMessage`: one wire-ready GELF message
//! - `GelfLevel`: syslog severity scale used by the GELF `level` field
//! - `ExporterError`: Top-level error type

pub mod error;
pub mod flat_message;
pub mod level;

pub use error::ExporterError;
pub use flat_message::{FieldValue, FlatMessage, GELF_VERSION};
pub use level::GelfLevel;
