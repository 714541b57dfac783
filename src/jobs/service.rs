use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use super::error::JobError;
use super::model::{Job, JobEvent, JobId, JobRequest};
use super::registry::JobRegistry;
use super::validation::validate_url;
use crate::config::{Config, DownloadConfig};
use crate::extractor::Extractor;
use crate::observability::Metrics;
use crate::worker::WorkerRunner;

/// A download as asked for by a control surface
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub url: String,
    /// Falls back to the configured destination
    pub destination_dir: Option<PathBuf>,
    /// Falls back to the configured format selector
    pub format: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Submit/query front door shared by the HTTP server and the console watcher
#[derive(Clone)]
pub struct DownloadService {
    registry: Arc<JobRegistry>,
    runner: WorkerRunner,
    defaults: DownloadConfig,
    metrics: Arc<Metrics>,
}

impl DownloadService {
    pub fn new(
        registry: Arc<JobRegistry>,
        runner: WorkerRunner,
        defaults: DownloadConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            runner,
            defaults,
            metrics,
        }
    }

    /// Wire a fresh registry and runner from configuration
    pub fn from_config(config: &Config, extractor: Arc<dyn Extractor>, metrics: Arc<Metrics>) -> Self {
        let registry = Arc::new(JobRegistry::new(config.worker.event_buffer));
        let runner = WorkerRunner::new(registry.clone(), extractor, &config.worker, metrics.clone());
        Self::new(registry, runner, config.download.clone(), metrics)
    }

    /// Validate, register as `pending`, and start the job in the background.
    ///
    /// The entry exists before this returns, so an immediate `query` never
    /// misses it.
    pub fn submit(&self, request: DownloadRequest) -> Result<JobId, JobError> {
        validate_url(&request.url)?;

        let job_request = JobRequest {
            url: request.url.trim().to_string(),
            destination_dir: request
                .destination_dir
                .unwrap_or_else(|| self.defaults.destination_dir.clone()),
            options: self.defaults.options(request.format.as_deref().filter(|f| !f.is_empty())),
        };

        let job_id = JobId::generate();
        self.registry.create(Job::pending(job_id.clone(), &job_request));
        self.metrics.job_submitted();
        info!(job_id = %job_id, url = %job_request.url, "Job accepted");

        self.runner.spawn(job_id.clone(), job_request);
        Ok(job_id)
    }

    pub fn query(&self, job_id: &JobId) -> Option<Job> {
        self.registry.get(job_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.registry.subscribe()
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn runner(&self) -> &WorkerRunner {
        &self.runner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerConfig;
    use crate::extractor::{MediaInfo, MockExtractor};
    use crate::jobs::JobStatus;

    fn service(extractor: MockExtractor) -> DownloadService {
        let registry = Arc::new(JobRegistry::new(64));
        let metrics = Arc::new(Metrics::new());
        let runner = WorkerRunner::new(
            registry.clone(),
            Arc::new(extractor),
            &WorkerConfig::default(),
            metrics.clone(),
        );
        let defaults = DownloadConfig {
            destination_dir: PathBuf::from("/srv/media"),
            ..DownloadConfig::default()
        };
        DownloadService::new(registry, runner, defaults, metrics)
    }

    #[tokio::test]
    async fn test_submit_creates_pending_entry_before_returning() {
        let service = service(MockExtractor::new(MediaInfo::new("abc", "Clip")));

        let id = service.submit(DownloadRequest::new("https://example.com/video")).unwrap();

        // No await between submit and query, so the runner has not been polled
        let job = service.query(&id).unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress_text, "Starting download...");
        assert_eq!(job.destination_dir, PathBuf::from("/srv/media"));
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_urls_without_creating_jobs() {
        let service = service(MockExtractor::new(MediaInfo::new("abc", "Clip")));

        let err = service.submit(DownloadRequest::new("")).unwrap_err();
        assert!(matches!(err, JobError::Validation(ref m) if m == "No URL provided"));

        let err = service.submit(DownloadRequest::new("ftp://example.com/x")).unwrap_err();
        assert!(matches!(err, JobError::Validation(ref m) if m == "Invalid URL format"));

        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn test_same_url_twice_gets_distinct_ids() {
        let service = service(MockExtractor::new(MediaInfo::new("abc", "Clip")));

        let a = service.submit(DownloadRequest::new("https://example.com/video")).unwrap();
        let b = service.submit(DownloadRequest::new("https://example.com/video")).unwrap();

        assert_ne!(a, b);
        assert_eq!(service.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_request_overrides_destination() {
        let service = service(MockExtractor::new(MediaInfo::new("abc", "Clip")));
        let request = DownloadRequest {
            destination_dir: Some(PathBuf::from("/tmp/elsewhere")),
            format: Some("bestaudio".to_string()),
            ..DownloadRequest::new("https://example.com/video")
        };

        let id = service.submit(request).unwrap();
        assert_eq!(service.query(&id).unwrap().destination_dir, PathBuf::from("/tmp/elsewhere"));
    }

    #[tokio::test]
    async fn test_query_unknown_id() {
        let service = service(MockExtractor::new(MediaInfo::new("abc", "Clip")));
        assert!(service.query(&JobId::from("nope")).is_none());
    }
}
