use gelf_udp_exporter::endpoint::{EndpointResolver, RefreshPoint, RefreshStrategy, ResolutionError};
use gelf_udp_exporter::test_support::ScriptedResolver;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, 1], port))
}

#[tokio::test]
async fn test_interval_reuses_address_until_due() {
    let scripted = ScriptedResolver::new(vec![Ok(addr(1)), Ok(addr(2))]);
    let resolver = EndpointResolver::with_resolver(
        "graylog:12201",
        RefreshStrategy::Interval(Duration::from_secs(60)),
        scripted.clone(),
    );
    let start = Instant::now();

    assert_eq!(resolver.destination(RefreshPoint::BatchStart, start).await.unwrap(), addr(1));
    assert_eq!(
        resolver
            .destination(RefreshPoint::Message, start + Duration::from_secs(59))
            .await
            .unwrap(),
        addr(1)
    );
    assert_eq!(scripted.calls(), 1);

    assert_eq!(
        resolver
            .destination(RefreshPoint::Message, start + Duration::from_secs(60))
            .await
            .unwrap(),
        addr(2)
    );
    assert_eq!(scripted.calls(), 2);
}

#[tokio::test]
async fn test_interval_is_measured_from_last_attempt() {
    let scripted = ScriptedResolver::new(vec![Ok(addr(1)), Err(()), Ok(addr(3))]);
    let resolver = EndpointResolver::with_resolver(
        "graylog:12201",
        RefreshStrategy::Interval(Duration::from_secs(10)),
        scripted.clone(),
    );
    let start = Instant::now();

    resolver.destination(RefreshPoint::Message, start).await.unwrap();
    // Failed refresh at t=10 keeps the old address and restarts the interval
    let at_10 = start + Duration::from_secs(10);
    assert_eq!(resolver.destination(RefreshPoint::Message, at_10).await.unwrap(), addr(1));
    let at_15 = start + Duration::from_secs(15);
    assert_eq!(resolver.destination(RefreshPoint::Message, at_15).await.unwrap(), addr(1));
    assert_eq!(scripted.calls(), 2);

    let at_20 = start + Duration::from_secs(20);
    assert_eq!(resolver.destination(RefreshPoint::Message, at_20).await.unwrap(), addr(3));

    let state = resolver.snapshot().await;
    assert_eq!(state.last_refresh, Some(at_20));
    assert_eq!(state.failed_refresh_count, 1);
}

#[tokio::test]
async fn test_per_batch_refreshes_only_at_batch_start() {
    let scripted = ScriptedResolver::new(vec![Ok(addr(1)), Ok(addr(2))]);
    let resolver =
        EndpointResolver::with_resolver("graylog:12201", RefreshStrategy::PerBatch, scripted.clone());
    let now = Instant::now();

    assert_eq!(resolver.destination(RefreshPoint::BatchStart, now).await.unwrap(), addr(1));
    assert_eq!(resolver.destination(RefreshPoint::Message, now).await.unwrap(), addr(1));
    assert_eq!(resolver.destination(RefreshPoint::BatchStart, now).await.unwrap(), addr(2));
    assert_eq!(scripted.calls(), 2);
}

#[tokio::test]
async fn test_never_resolved_reports_error() {
    let resolver = EndpointResolver::with_resolver(
        "graylog:12201",
        RefreshStrategy::PerBatch,
        ScriptedResolver::new(vec![Err(())]),
    );

    let err = resolver
        .destination(RefreshPoint::BatchStart, Instant::now())
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::NoRecords { .. }));
    assert_eq!(resolver.snapshot().await.destination, None);
}

#[tokio::test]
async fn test_concurrent_queries_share_one_resolution() {
    let scripted = ScriptedResolver::new(vec![Ok(addr(1))]);
    let resolver = std::sync::Arc::new(EndpointResolver::with_resolver(
        "graylog:12201",
        RefreshStrategy::Static,
        scripted.clone(),
    ));
    let now = Instant::now();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.destination(RefreshPoint::Message, now).await })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), addr(1));
    }
    assert_eq!(scripted.calls(), 1);
}
