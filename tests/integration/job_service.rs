//! Integration tests for the enqueue and status operations
//!
//! Tests cover:
//! - Unknown categories and ids
//! - Queue positions while pending
//! - Failure isolation between jobs
//! - Monotonic status

use super::test_utils::{config_with, counting_backend, input, service_for, watch_processing, Probe};
use jobgate::{
    BackendError, Category, DispatchTable, FnBackend, JobId, JobInput, JobService, JobStatus,
    QueueError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn idle_service() -> JobService {
    let config = config_with(Category::TextTo3d, 2, 2);
    service_for(
        Category::TextTo3d,
        Arc::new(counting_backend(Duration::from_millis(1), Arc::new(Probe::default()))),
        &config,
    )
}

#[tokio::test]
async fn bogus_category_creates_nothing() {
    let service = idle_service();
    let err = service.enqueue("bogus", "u", JobInput::new()).unwrap_err();
    assert!(matches!(err, QueueError::UnknownCategory(ref name) if name == "bogus"));
    assert_eq!(err.to_string(), "Unknown job category: bogus");
    assert_eq!(service.queue_len(), 0);
    assert_eq!(service.stats().pending, 0);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let service = idle_service();
    let id: JobId = "999999999".parse().unwrap();
    assert!(matches!(service.status(id), Err(QueueError::NotFound(_))));
}

#[tokio::test]
async fn pending_positions_follow_enqueue_order() {
    let service = idle_service();
    let ids: Vec<JobId> = (0..4)
        .map(|n| service.enqueue("Texto3D", "u", input(&n.to_string())).unwrap())
        .collect();

    let positions: Vec<usize> = ids
        .iter()
        .map(|id| service.status(*id).unwrap().position.unwrap())
        .collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);

    let report = service.status(ids[0]).unwrap();
    let wire = serde_json::to_value(&report).unwrap();
    assert_eq!(wire["status"], "queued");
    assert_eq!(wire["position"], 1);
    assert_eq!(wire["category"], "Texto3D");
    assert!(wire.get("result").is_none());
}

#[tokio::test]
async fn failing_job_does_not_stop_the_pool() {
    let dispatch = DispatchTable::new().register(
        Category::TextToImage2d,
        Arc::new(FnBackend::new("flaky", |_owner: String, input: JobInput| async move {
            if input.get("fail").is_some() {
                Err(BackendError::from_provider_message(
                    "You have exceeded your GPU quota",
                ))
            } else {
                Ok(json!({ "image": "out.png" }))
            }
        })),
    );
    let config = config_with(Category::TextToImage2d, 1, 1);
    let service = JobService::new(&config, dispatch).unwrap();
    service.start().unwrap();

    let mut bad = JobInput::new();
    bad.insert("fail".into(), json!(true));
    let failed = service.enqueue("TextoImagen2D", "u", bad).unwrap();
    let ok = service.enqueue("TextoImagen2D", "u", JobInput::new()).unwrap();

    let (_, stats) = watch_processing(&service, Duration::from_secs(5)).await;
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.completed, 1);

    let failed = service.status(failed).unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert!(failed.result.is_none());
    assert!(!failed.error.unwrap().is_empty());

    let ok = service.status(ok).unwrap();
    assert_eq!(ok.status, JobStatus::Completed);
    assert_eq!(ok.result.unwrap()["image"], "out.png");
    assert!(ok.error.is_none());

    service.shutdown().await;
}

#[tokio::test]
async fn status_never_moves_backwards() {
    let config = config_with(Category::MultiImageTo3d, 1, 1);
    let service = service_for(
        Category::MultiImageTo3d,
        Arc::new(counting_backend(Duration::from_millis(30), Arc::new(Probe::default()))),
        &config,
    );
    service.start().unwrap();
    let ids: Vec<JobId> = (0..3)
        .map(|n| service.enqueue("MultiImagen3D", "u", input(&n.to_string())).unwrap())
        .collect();

    let rank = |status: JobStatus| match status {
        JobStatus::Pending => 0,
        JobStatus::Processing => 1,
        JobStatus::Completed | JobStatus::Failed => 2,
    };
    let mut last = vec![0; ids.len()];
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let mut done = true;
        for (slot, id) in ids.iter().enumerate() {
            let status = service.status(*id).unwrap().status;
            let now = rank(status);
            assert!(now >= last[slot], "job {} went backwards", id);
            last[slot] = now;
            done &= status.is_terminal();
        }
        if done {
            break;
        }
        assert!(Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let first = service.status(ids[0]).unwrap();
    assert!(first.started_at.unwrap() <= first.finished_at.unwrap());
    service.shutdown().await;
}

#[tokio::test]
async fn owner_check_on_status() {
    let service = idle_service();
    let id = service.enqueue("Texto3D", "alice", JobInput::new()).unwrap();
    assert_eq!(service.status_for_owner(id, "alice").unwrap().id, id);
    assert!(matches!(
        service.status_for_owner(id, "bob"),
        Err(QueueError::Forbidden(forbidden)) if forbidden == id
    ));
}
