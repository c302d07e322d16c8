//! Flattening and GELF encoding benchmarks.
//!
//! Measures the per-record cost of turning OTLP batches into wire-ready
//! datagrams.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gelf_udp_exporter::mapper::flatten;
use gelf_udp_exporter::sender::{Compression, GelfEncoder};
use gelf_udp_exporter::test_support::{
    log_record, request, resource, resource_logs, scope, scope_logs, string_kv,
};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use std::hint::black_box;

fn create_batch(size: usize) -> ExportLogsServiceRequest {
    let records = (0..size)
        .map(|i| {
            let mut record = log_record(
                &format!("Benchmark log message with some content and details for entry {i}"),
                9,
                1_700_000_000_000_000_000 + i as u64,
            );
            record.trace_id = vec![0x4b; 16];
            record.span_id = vec![0x0f; 8];
            record.attributes = vec![
                string_kv("http.method", "GET"),
                string_kv("http.route", "/api/v1/benchmark"),
                string_kv("request_id", &format!("req-{i}")),
            ];
            record
        })
        .collect();

    request(vec![resource_logs(
        Some(resource(
            vec![
                string_kv("service.name", "benchmark-service"),
                string_kv("host.name", "benchmark-host"),
            ],
            0,
        )),
        vec![scope_logs(Some(scope("benchmark", "1.0")), records)],
    )])
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for batch_size in [100, 1000, 10000] {
        let batch = create_batch(batch_size);
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch, |b, batch| {
            b.iter(|| black_box(flatten(batch).count()));
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let messages: Vec<_> = flatten(&create_batch(1000)).collect();
    group.throughput(Throughput::Elements(messages.len() as u64));

    for compression in [Compression::None, Compression::Gzip] {
        let encoder = GelfEncoder::new(compression, 1420);
        group.bench_with_input(
            BenchmarkId::from_parameter(compression),
            &messages,
            |b, messages| {
                b.iter(|| {
                    for message in messages {
                        black_box(encoder.encode(message).ok());
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_encode);
criterion_main!(benches);
