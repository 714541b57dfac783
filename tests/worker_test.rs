//! Job lifecycle tests against the public service API
//!
//! Every test drives a scripted extractor; nothing touches the network.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast};

use grabbox::config::{Config, WorkerConfig};
use grabbox::extractor::{MediaInfo, MockExtractor, RawProgress, Step};
use grabbox::jobs::{DownloadRequest, DownloadService, Job, JobEvent, JobId, JobStatus, retention};
use grabbox::observability::Metrics;

fn service_with(extractor: Arc<MockExtractor>, worker: WorkerConfig) -> (DownloadService, Arc<Metrics>) {
    let config = Config {
        worker,
        ..Config::default()
    };
    let metrics = Arc::new(Metrics::new());
    let service = DownloadService::from_config(&config, extractor, metrics.clone());
    (service, metrics)
}

async fn until_terminal(events: &mut broadcast::Receiver<JobEvent>, id: &JobId) -> Vec<Job> {
    let mut history = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if &event.job.id != id {
                continue;
            }
            let terminal = event.job.status.is_terminal();
            history.push(event.job);
            if terminal {
                break;
            }
        }
    })
    .await
    .expect("job never finished");
    history
}

#[tokio::test]
async fn test_status_only_moves_forward() {
    let extractor = Arc::new(MockExtractor::new(MediaInfo::new("abc", "Clip")).with_script(vec![
        Step::Emit(RawProgress::downloading(10, Some(100), None)),
        Step::Emit(RawProgress::downloading(60, Some(100), None)),
        Step::Emit(RawProgress::finished()),
        // A straggler after the file is done must not rewind the job
        Step::Emit(RawProgress::downloading(100, Some(100), None)),
    ]));
    let (service, _) = service_with(extractor, WorkerConfig::default());
    let mut events = service.subscribe();

    let id = service.submit(DownloadRequest::new("https://example.com/video")).unwrap();
    let history = until_terminal(&mut events, &id).await;

    let statuses: Vec<JobStatus> = history.iter().map(|job| job.status).collect();
    assert!(statuses.windows(2).all(|pair| pair[0].can_transition_to(pair[1])));
    assert_eq!(statuses.last(), Some(&JobStatus::Completed));

    for job in history.iter().filter(|job| job.status == JobStatus::Downloading) {
        let percent = job.percent().unwrap();
        assert!((0.0..=100.0).contains(&percent));
    }
}

#[tokio::test]
async fn test_media_names_survive_to_terminal_state() {
    let extractor = Arc::new(MockExtractor::new(MediaInfo::new("abc", "Clip")).with_script(vec![
        Step::Emit(RawProgress::downloading(10, Some(100), None)),
        Step::Fail("connection reset".to_string()),
    ]));
    let (service, metrics) = service_with(extractor, WorkerConfig::default());
    let mut events = service.subscribe();

    let id = service.submit(DownloadRequest::new("https://example.com/video")).unwrap();
    let history = until_terminal(&mut events, &id).await;

    let first_named = history.iter().position(|job| job.title.is_some()).unwrap();
    for job in &history[first_named..] {
        assert_eq!(job.title.as_deref(), Some("Clip"));
        assert_eq!(job.media_id.as_deref(), Some("abc"));
    }

    let last = history.last().unwrap();
    assert_eq!(last.status, JobStatus::Error);
    assert_eq!(last.error_detail.as_deref(), Some("Download failed: connection reset"));
    assert_eq!(metrics.snapshot().jobs_failed, 1);
}

#[tokio::test]
async fn test_panicking_extractor_is_contained() {
    let extractor = Arc::new(
        MockExtractor::new(MediaInfo::new("abc", "Clip")).with_script(vec![Step::Panic("boom".to_string())]),
    );
    let (service, _) = service_with(extractor, WorkerConfig::default());
    let mut events = service.subscribe();

    let id = service.submit(DownloadRequest::new("https://example.com/video")).unwrap();
    let history = until_terminal(&mut events, &id).await;

    let last = history.last().unwrap();
    assert_eq!(last.status, JobStatus::Error);
    assert!(last.progress_text.starts_with("Error: Internal error"));

    // The service keeps accepting work
    assert!(service.submit(DownloadRequest::new("https://example.com/other")).is_ok());
}

#[tokio::test]
async fn test_concurrency_limit_admits_jobs_in_turn() {
    let gate = Arc::new(Notify::new());
    let extractor = Arc::new(
        MockExtractor::new(MediaInfo::new("abc", "Clip")).with_script(vec![Step::Wait(gate.clone())]),
    );
    let worker = WorkerConfig {
        max_concurrent_jobs: 2,
        ..WorkerConfig::default()
    };
    let (service, _) = service_with(extractor.clone(), worker);
    let mut events = service.subscribe();

    let ids: Vec<JobId> = (0..3)
        .map(|i| service.submit(DownloadRequest::new(format!("https://example.com/{}", i))).unwrap())
        .collect();

    // Two jobs reach the download; the third waits for a permit
    let mut started = 0;
    while started < 2 {
        let event = events.recv().await.unwrap();
        if event.job.progress_text.starts_with("Starting download for") {
            started += 1;
        }
    }
    tokio::task::yield_now().await;
    assert_eq!(extractor.probe_calls(), 2);

    for _ in 0..3 {
        gate.notify_one();
        tokio::task::yield_now().await;
    }

    for id in &ids {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if service.query(id).unwrap().status.is_terminal() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "job {} never finished", id);
            // Hand out spare permits in case a waiter missed one
            gate.notify_one();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(service.query(id).unwrap().status, JobStatus::Completed);
    }
    assert_eq!(extractor.download_calls(), 3);
}

#[tokio::test]
async fn test_retention_sweep_evicts_finished_jobs() {
    let extractor = Arc::new(MockExtractor::new(MediaInfo::new("abc", "Clip")));
    let (service, metrics) = service_with(extractor, WorkerConfig::default());
    let mut events = service.subscribe();

    let id = service.submit(DownloadRequest::new("https://example.com/video")).unwrap();
    until_terminal(&mut events, &id).await;

    // A generous TTL keeps it
    assert_eq!(retention::sweep_once(service.registry(), Duration::from_secs(3600), &metrics), 0);
    assert!(service.query(&id).is_some());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(retention::sweep_once(service.registry(), Duration::from_millis(1), &metrics), 1);
    assert!(service.query(&id).is_none());
    assert_eq!(metrics.snapshot().jobs_evicted, 1);
}
