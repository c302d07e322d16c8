//! Shared test support utilities
//!
//! Provides a recording `Transport`, a scripted `Resolve` implementation and
//! small builders for OTLP log requests, for use in unit and integration
//! tests.

use opentelemetry_proto::tonic::{
    collector::logs::v1::ExportLogsServiceRequest,
    common::v1::{AnyValue, InstrumentationScope, KeyValue, any_value},
    logs::v1::{LogRecord, ResourceLogs, ScopeLogs},
    resource::v1::Resource,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::FlatMessage;
use crate::endpoint::{Resolve, ResolutionError};
use crate::sender::{Transport, TransportError};

/// Transport that records every message instead of sending it.
///
/// Attempts whose zero-based index is in the failure set return a send
/// error and are not recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<(SocketAddr, FlatMessage)>>>,
    attempts: Arc<AtomicUsize>,
    fail_on: Arc<HashSet<usize>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_on: Arc::new(indices.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(SocketAddr, FlatMessage)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn destinations(&self) -> Vec<SocketAddr> {
        self.sent().into_iter().map(|(destination, _)| destination).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    async fn send(
        &self,
        destination: SocketAddr,
        message: &FlatMessage,
    ) -> Result<usize, TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&attempt) {
            return Err(TransportError::Send {
                destination,
                source: std::io::Error::other("Mock send failure"),
            });
        }

        let bytes = message.short_message.len();
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((destination, message.clone()));
        Ok(bytes)
    }
}

/// Resolver returning a fixed sequence of results, one per call.
///
/// Once the script is exhausted the last entry repeats. `Err(())` stands for
/// a lookup that returned no records.
#[derive(Debug, Clone)]
pub struct ScriptedResolver {
    script: Arc<Vec<Result<SocketAddr, ()>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(script: Vec<Result<SocketAddr, ()>>) -> Self {
        Self {
            script: Arc::new(script),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Resolve for ScriptedResolver {
    async fn resolve(&self, endpoint: &str) -> Result<SocketAddr, ResolutionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(Err(()));

        entry.map_err(|()| ResolutionError::NoRecords {
            endpoint: endpoint.to_string(),
        })
    }
}

pub fn string_value(value: &str) -> AnyValue {
    AnyValue {
        value: Some(any_value::Value::StringValue(value.to_string())),
    }
}

pub fn string_kv(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(string_value(value)),
    }
}

pub fn log_record(body: &str, severity_number: i32, time_unix_nano: u64) -> LogRecord {
    LogRecord {
        time_unix_nano,
        observed_time_unix_nano: 0,
        severity_number,
        severity_text: String::new(),
        body: Some(string_value(body)),
        attributes: vec![],
        dropped_attributes_count: 0,
        flags: 0,
        trace_id: vec![],
        span_id: vec![],
        event_name: String::new(),
    }
}

pub fn resource(attributes: Vec<KeyValue>, dropped_attributes_count: u32) -> Resource {
    Resource {
        attributes,
        dropped_attributes_count,
        entity_refs: vec![],
    }
}

pub fn scope(name: &str, version: &str) -> InstrumentationScope {
    InstrumentationScope {
        name: name.to_string(),
        version: version.to_string(),
        attributes: vec![],
        dropped_attributes_count: 0,
    }
}

pub fn scope_logs(scope: Option<InstrumentationScope>, log_records: Vec<LogRecord>) -> ScopeLogs {
    ScopeLogs {
        scope,
        log_records,
        schema_url: String::new(),
    }
}

pub fn resource_logs(resource: Option<Resource>, scope_logs: Vec<ScopeLogs>) -> ResourceLogs {
    ResourceLogs {
        resource,
        scope_logs,
        schema_url: String::new(),
    }
}

pub fn request(resource_logs: Vec<ResourceLogs>) -> ExportLogsServiceRequest {
    ExportLogsServiceRequest { resource_logs }
}

/// One resource, one scope, `count` records with increasing timestamps.
pub fn simple_request(count: usize) -> ExportLogsServiceRequest {
    let records = (0..count)
        .map(|i| log_record(&format!("message {i}"), 9, 1_700_000_000_000_000_000 + i as u64))
        .collect();
    request(vec![resource_logs(
        Some(resource(vec![string_kv("service.name", "test-service")], 0)),
        vec![scope_logs(Some(scope("otlp", "1.0")), records)],
    )])
}
