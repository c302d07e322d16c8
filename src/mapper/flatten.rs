//! Batch flattener: resource → scope → record walk producing flat messages
//! in input order.

use opentelemetry_proto::tonic::{
    collector::logs::v1::ExportLogsServiceRequest, logs::v1::ResourceLogs,
};

use super::record::{ResourceContext, ScopeContext, map_record};
use crate::domain::FlatMessage;

/// Lazily flatten a whole export request.
///
/// Order is resource-major, scope-minor, record-minor. Empty resources and
/// scopes simply contribute nothing.
pub fn flatten(request: &ExportLogsServiceRequest) -> impl Iterator<Item = FlatMessage> + '_ {
    request.resource_logs.iter().flat_map(flatten_resource_logs)
}

/// Flatten the records of a single `ResourceLogs`.
pub fn flatten_resource_logs(
    resource_logs: &ResourceLogs,
) -> impl Iterator<Item = FlatMessage> + '_ {
    let resource = ResourceContext::new(resource_logs.resource.as_ref());

    resource_logs.scope_logs.iter().flat_map(move |scope_logs| {
        let resource = resource.clone();
        let scope = ScopeContext::new(scope_logs.scope.as_ref());
        scope_logs
            .log_records
            .iter()
            .map(move |record| map_record(record, &scope, &resource))
    })
}

/// Number of records in the request, without mapping them.
pub fn record_count(request: &ExportLogsServiceRequest) -> usize {
    request
        .resource_logs
        .iter()
        .flat_map(|rl| &rl.scope_logs)
        .map(|sl| sl.log_records.len())
        .sum()
}
