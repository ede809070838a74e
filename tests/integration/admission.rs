//! Integration tests for per-category admission
//!
//! Tests cover:
//! - Capacity bound under a backlog
//! - Independence of categories
//! - Slot release on shutdown

use super::test_utils::{config_with, counting_backend, input, service_for, watch_processing, Probe};
use jobgate::{Category, DispatchTable, JobService, JobStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn capacity_two_runs_five_jobs_two_at_a_time() {
    let probe = Arc::new(Probe::default());
    let config = config_with(Category::ImageTo3d, 2, 4);
    let service = service_for(
        Category::ImageTo3d,
        Arc::new(counting_backend(Duration::from_millis(100), Arc::clone(&probe))),
        &config,
    );
    service.start().unwrap();

    let ids: Vec<_> = (0..5)
        .map(|n| {
            service
                .enqueue("Imagen3D", "renderer", input(&format!("r{}", n)))
                .unwrap()
        })
        .collect();

    let (peak_processing, stats) = watch_processing(&service, Duration::from_secs(10)).await;
    assert!(peak_processing <= 2, "saw {} processing", peak_processing);
    assert_eq!(probe.peak(), 2);
    assert_eq!(stats.completed, 5);

    let counters: HashSet<u64> = ids
        .iter()
        .map(|id| {
            let report = service.status(*id).unwrap();
            assert_eq!(report.status, JobStatus::Completed);
            report.result.unwrap()["counter"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(counters.len(), 5);

    service.shutdown().await;
}

#[tokio::test]
async fn saturated_category_does_not_block_another() {
    let slow_probe = Arc::new(Probe::default());
    let fast_probe = Arc::new(Probe::default());
    let mut config = config_with(Category::SketchTo3d, 1, 4);
    config
        .capacities
        .insert(Category::TextTo3d.as_str().to_string(), 4);

    let dispatch = DispatchTable::new()
        .register(
            Category::SketchTo3d,
            Arc::new(counting_backend(Duration::from_millis(400), Arc::clone(&slow_probe))),
        )
        .register(
            Category::TextTo3d,
            Arc::new(counting_backend(Duration::from_millis(10), Arc::clone(&fast_probe))),
        );
    let service = JobService::new(&config, dispatch).unwrap();
    service.start().unwrap();

    let sketch = service.enqueue("Boceto3D", "u", input("s")).unwrap();
    let text = service.enqueue("Texto3D", "u", input("t")).unwrap();

    let started = Instant::now();
    while service.status(text).unwrap().status != JobStatus::Completed {
        assert!(started.elapsed() < Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_ne!(service.status(sketch).unwrap().status, JobStatus::Completed);
    assert_eq!(slow_probe.peak(), 1);

    service.shutdown().await;
}

#[tokio::test]
async fn shutdown_releases_every_slot() {
    let probe = Arc::new(Probe::default());
    let config = config_with(Category::Unico3d, 3, 3);
    let service = service_for(
        Category::Unico3d,
        Arc::new(counting_backend(Duration::from_secs(30), Arc::clone(&probe))),
        &config,
    );
    service.start().unwrap();
    for n in 0..3 {
        service.enqueue("Unico3D", "u", input(&n.to_string())).unwrap();
    }

    let started = Instant::now();
    while service.in_flight(Category::Unico3d) != Some(3) {
        assert!(started.elapsed() < Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    service.shutdown().await;
    assert_eq!(service.in_flight(Category::Unico3d), Some(0));
    assert_eq!(service.stats().processing, 3);
}
