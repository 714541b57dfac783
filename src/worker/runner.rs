//! Job runner - drives one job from probe to terminal state

use std::any::Any;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::WorkerConfig;
use crate::extractor::{Extractor, ExtractorError, MediaInfo, RawProgress};
use crate::jobs::translator::{UNKNOWN_ID, UNKNOWN_TITLE, translate};
use crate::jobs::{JobError, JobId, JobRegistry, JobRequest, JobStatus, JobUpdate, RegistryError};
use crate::observability::Metrics;

/// Spawns and supervises job tasks against a shared registry
#[derive(Clone)]
pub struct WorkerRunner {
    registry: Arc<JobRegistry>,
    extractor: Arc<dyn Extractor>,
    limiter: Option<Arc<Semaphore>>,
    metrics: Arc<Metrics>,
}

impl WorkerRunner {
    pub fn new(
        registry: Arc<JobRegistry>,
        extractor: Arc<dyn Extractor>,
        config: &WorkerConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            registry,
            extractor,
            limiter: config.concurrency_limit().map(|n| Arc::new(Semaphore::new(n))),
            metrics,
        }
    }

    pub fn extractor(&self) -> &Arc<dyn Extractor> {
        &self.extractor
    }

    /// Run the job in the background; the returned handle resolves once the
    /// job has reached a terminal state
    pub fn spawn(&self, job_id: JobId, request: JobRequest) -> JoinHandle<()> {
        let runner = self.clone();
        let span = info_span!("job", job_id = %job_id);
        tokio::spawn(runner.supervise(job_id, request).instrument(span))
    }

    async fn supervise(self, job_id: JobId, request: JobRequest) {
        let _permit = match &self.limiter {
            Some(limiter) => match limiter.clone().acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.finish_with_error(&job_id, JobError::Internal("worker pool closed".to_string()));
                    return;
                }
            },
            None => None,
        };

        // Inner task so a panic in the engine surfaces as a JoinError
        let body = {
            let runner = self.clone();
            let job_id = job_id.clone();
            tokio::spawn(async move { runner.execute(&job_id, &request).await }.in_current_span())
        };

        let outcome = match body.await {
            Ok(outcome) => outcome,
            Err(e) => Err(JobError::Internal(join_failure(e))),
        };

        match outcome {
            Ok(info) => self.finish_with_success(&job_id, &info),
            Err(e) => self.finish_with_error(&job_id, e),
        }
    }

    async fn execute(&self, job_id: &JobId, request: &JobRequest) -> Result<MediaInfo, JobError> {
        info!(url = %request.url, extractor = self.extractor.name(), "Job started");
        self.write(job_id, JobUpdate::new(JobStatus::Pending, "Extracting media information..."))?;

        let info = self
            .extractor
            .probe(&request.url, &request.options)
            .await
            .map_err(|e| JobError::Metadata(e.to_string()))?;
        if info.is_empty() {
            return Err(JobError::Metadata(ExtractorError::EmptyMetadata.to_string()));
        }

        let (title, media_id) = display_names(&info);
        debug!(title, media_id, "Metadata resolved");
        self.write(
            job_id,
            JobUpdate::new(
                JobStatus::Pending,
                format!("Starting download for: {} [{}]", title, media_id),
            )
            .with_media(info.title.clone(), info.id.clone()),
        )?;

        let registry = &self.registry;
        let mut late_stream_seen = false;
        let mut on_progress = |event: RawProgress| match registry.update_with(job_id, |job| translate(job, &event)) {
            Ok(_) => {}
            // Formats like bestvideo+bestaudio start a second stream after the first finished
            Err(RegistryError::InvalidTransition {
                from: JobStatus::Processing,
                to: JobStatus::Downloading,
                ..
            }) => {
                if !late_stream_seen {
                    late_stream_seen = true;
                    info!("Ignoring progress for an additional stream after processing started");
                }
            }
            Err(e) => debug!(error = %e, status = %event.status, "Progress event not applied"),
        };

        self.extractor
            .download(&request.url, &request.destination_dir, &request.options, &mut on_progress)
            .await
            .map_err(|e| JobError::Transfer(e.to_string()))?;

        Ok(info)
    }

    fn write(&self, job_id: &JobId, update: JobUpdate) -> Result<(), JobError> {
        self.registry
            .update(job_id, update)
            .map(|_| ())
            .map_err(|e| JobError::Internal(e.to_string()))
    }

    fn finish_with_success(&self, job_id: &JobId, info: &MediaInfo) {
        let (title, media_id) = display_names(info);
        let update = JobUpdate::new(
            JobStatus::Completed,
            format!("Successfully downloaded: {} [{}]", title, media_id),
        );

        match self.registry.update(job_id, update) {
            Ok(_) => {
                self.metrics.job_completed();
                info!(title, "Job completed");
            }
            // The engine reported an error event but still exited cleanly
            Err(RegistryError::InvalidTransition { from: JobStatus::Error, .. }) => {
                self.metrics.job_failed();
                warn!("Download finished after an error was reported");
            }
            Err(e) => error!(error = %e, "Failed to record job completion"),
        }
    }

    fn finish_with_error(&self, job_id: &JobId, failure: JobError) {
        self.metrics.job_failed();
        warn!(kind = failure.kind(), error = %failure, "Job failed");

        match self.registry.update(job_id, JobUpdate::failed(failure.to_string())) {
            Ok(_) => {}
            Err(RegistryError::InvalidTransition { from: JobStatus::Error, .. }) => {
                debug!("Job already in error state");
            }
            Err(e) => error!(error = %e, "Failed to record job failure"),
        }
    }
}

fn display_names(info: &MediaInfo) -> (&str, &str) {
    (
        info.title.as_deref().unwrap_or(UNKNOWN_TITLE),
        info.id.as_deref().unwrap_or(UNKNOWN_ID),
    )
}

fn join_failure(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    panic_message(e.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", message)
    } else {
        "worker panicked".to_string()
    }
}
