//! OTLP logs to flat GELF message mapping
//!
//! This module provides:
//! - Rendering of OTLP `AnyValue`s into text and GELF field values
//! - The per-record field mapper with its scope/resource context
//! - The lazy batch flattener walking resource → scope → record

pub mod flatten;
pub mod record;
pub mod value;

pub use flatten::{flatten, flatten_resource_logs, record_count};
pub use record::{ResourceContext, ScopeContext, map_record};
