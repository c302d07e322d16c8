//! Field mapper: one OTLP log record plus its ancestor context → one
//! [`FlatMessage`].

use opentelemetry_proto::tonic::{
    common::v1::{InstrumentationScope, KeyValue},
    logs::v1::LogRecord,
    resource::v1::Resource,
};

use super::value::{
    any_value_to_field, any_value_to_text, body_text, encode_span_id, encode_trace_id,
    sanitize_field_name, string_attribute,
};
use crate::domain::{FlatMessage, GelfLevel};

/// Host used when the resource carries neither `host.name` nor `service.name`.
pub const UNKNOWN_HOST: &str = "unknown";

pub const HOST_NAME_KEY: &str = "host.name";
pub const SERVICE_NAME_KEY: &str = "service.name";
pub const STACKTRACE_KEY: &str = "exception.stacktrace";

pub const LOG_DROPPED_ATTRIBUTES_COUNT: &str = "log_dropped_attributes_count";
pub const LOG_EVENT_NAME: &str = "log_event_name";
pub const LOG_SEVERITY_TEXT: &str = "log_severity_text";
pub const LOG_SPAN_ID: &str = "log_span_id";
pub const LOG_TRACE_ID: &str = "log_trace_id";

pub const SCOPE_PREFIX: &str = "scope_";
pub const SCOPE_DROPPED_ATTRIBUTES_COUNT: &str = "scope_dropped_attributes_count";
pub const SCOPE_NAME: &str = "scope_name";
pub const SCOPE_VERSION: &str = "scope_version";

pub const RESOURCE_PREFIX: &str = "resource_";
pub const RESOURCE_DROPPED_ATTRIBUTES_COUNT: &str = "resource_dropped_attributes_count";

const SCOPE_METADATA_NAMES: &[&str] = &["name", "version", "dropped_attributes_count"];
const RESOURCE_METADATA_NAMES: &[&str] = &["dropped_attributes_count"];

/// Prefix applied to record attributes whose name would shadow a reserved key.
pub const ATTRIBUTE_ESCAPE_PREFIX: &str = "attr_";

const GELF_STANDARD_FIELDS: &[&str] = &[
    "version",
    "host",
    "short_message",
    "full_message",
    "timestamp",
    "level",
    "facility",
    "line",
    "file",
    "id",
];

const LOG_METADATA_FIELDS: &[&str] = &[
    LOG_DROPPED_ATTRIBUTES_COUNT,
    LOG_EVENT_NAME,
    LOG_SEVERITY_TEXT,
    LOG_SPAN_ID,
    LOG_TRACE_ID,
];

/// Enrichment shared by every record of one `ResourceLogs`.
#[derive(Debug, Clone)]
pub struct ResourceContext<'a> {
    pub host: String,
    pub attributes: &'a [KeyValue],
    pub dropped_attributes_count: u32,
}

impl<'a> ResourceContext<'a> {
    /// A missing resource behaves as an empty one.
    pub fn new(resource: Option<&'a Resource>) -> Self {
        let attributes = resource.map(|r| r.attributes.as_slice()).unwrap_or_default();
        let host = string_attribute(attributes, HOST_NAME_KEY)
            .or_else(|| string_attribute(attributes, SERVICE_NAME_KEY))
            .unwrap_or(UNKNOWN_HOST)
            .to_string();

        Self {
            host,
            attributes,
            dropped_attributes_count: resource.map(|r| r.dropped_attributes_count).unwrap_or(0),
        }
    }

    pub fn enrich(&self, message: &mut FlatMessage) {
        message.insert_extra(RESOURCE_DROPPED_ATTRIBUTES_COUNT, self.dropped_attributes_count);
        insert_prefixed(message, RESOURCE_PREFIX, RESOURCE_METADATA_NAMES, self.attributes);
    }
}

/// Enrichment shared by every record of one `ScopeLogs`.
#[derive(Debug, Clone, Copy)]
pub struct ScopeContext<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub attributes: &'a [KeyValue],
    pub dropped_attributes_count: u32,
}

impl<'a> ScopeContext<'a> {
    /// A missing scope behaves as an empty one.
    pub fn new(scope: Option<&'a InstrumentationScope>) -> Self {
        match scope {
            Some(scope) => Self {
                name: &scope.name,
                version: &scope.version,
                attributes: &scope.attributes,
                dropped_attributes_count: scope.dropped_attributes_count,
            },
            None => Self {
                name: "",
                version: "",
                attributes: &[],
                dropped_attributes_count: 0,
            },
        }
    }

    pub fn enrich(&self, message: &mut FlatMessage) {
        message.insert_extra(SCOPE_DROPPED_ATTRIBUTES_COUNT, self.dropped_attributes_count);
        message.insert_extra(SCOPE_NAME, self.name);
        message.insert_extra(SCOPE_VERSION, self.version);
        insert_prefixed(message, SCOPE_PREFIX, SCOPE_METADATA_NAMES, self.attributes);
    }
}

/// Map one record into a complete message carrying its own fields plus the
/// scope and resource enrichment.
pub fn map_record(
    record: &LogRecord,
    scope: &ScopeContext<'_>,
    resource: &ResourceContext<'_>,
) -> FlatMessage {
    let mut message = FlatMessage::new(resource.host.clone(), body_text(record.body.as_ref()));
    message.timestamp = timestamp_seconds(record.time_unix_nano, record.observed_time_unix_nano);
    message.level = GelfLevel::from_severity_number(record.severity_number);
    message.full_message = string_attribute(&record.attributes, STACKTRACE_KEY).map(str::to_string);

    message.insert_extra(LOG_DROPPED_ATTRIBUTES_COUNT, record.dropped_attributes_count);
    message.insert_extra(LOG_EVENT_NAME, record.event_name.as_str());
    message.insert_extra(LOG_SEVERITY_TEXT, record.severity_text.as_str());
    message.insert_extra(LOG_SPAN_ID, encode_span_id(&record.span_id));
    message.insert_extra(LOG_TRACE_ID, encode_trace_id(&record.trace_id));

    for kv in &record.attributes {
        if kv.key.is_empty() {
            continue;
        }
        if kv.key == STACKTRACE_KEY && message.full_message.is_some() {
            continue;
        }
        let Some(value) = kv.value.as_ref() else {
            continue;
        };
        message.insert_extra_unique(record_field_name(&kv.key), any_value_to_field(value));
    }

    scope.enrich(&mut message);
    resource.enrich(&mut message);
    message
}

/// Convert record timestamps to fractional Unix seconds.
///
/// The observed timestamp is used when the primary one is zero; when both
/// are zero the current wall clock is used.
pub fn timestamp_seconds(time_unix_nano: u64, observed_time_unix_nano: u64) -> f64 {
    let nanos = if time_unix_nano != 0 {
        time_unix_nano
    } else {
        observed_time_unix_nano
    };

    if nanos == 0 {
        return chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    }
    nanos as f64 / 1e9
}

/// Sanitized extra-field name for a record attribute.
pub fn record_field_name(key: &str) -> String {
    let sanitized = sanitize_field_name(key);
    if is_reserved(&sanitized) {
        format!("{ATTRIBUTE_ESCAPE_PREFIX}{sanitized}")
    } else {
        sanitized
    }
}

fn is_reserved(name: &str) -> bool {
    GELF_STANDARD_FIELDS.contains(&name)
        || LOG_METADATA_FIELDS.contains(&name)
        || name.starts_with(SCOPE_PREFIX)
        || name.starts_with(RESOURCE_PREFIX)
}

/// Scope or resource attributes land under `prefix`. Names that match the
/// level's own metadata are escaped, and the metadata is written first so a
/// sanitized duplicate can only ever get a suffix.
fn insert_prefixed(
    message: &mut FlatMessage,
    prefix: &str,
    metadata_names: &[&str],
    attributes: &[KeyValue],
) {
    for kv in attributes {
        if kv.key.is_empty() {
            continue;
        }
        let Some(value) = kv.value.as_ref() else {
            continue;
        };
        let name = sanitize_field_name(&kv.key);
        let key = if metadata_names.contains(&name.as_str()) {
            format!("{prefix}{ATTRIBUTE_ESCAPE_PREFIX}{name}")
        } else {
            format!("{prefix}{name}")
        };
        message.insert_extra_unique(key, any_value_to_text(value));
    }
}
