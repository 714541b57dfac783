//! Console control surface: submit one download and follow it to the end

use chrono::Local;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::jobs::{DownloadRequest, DownloadService, Job, JobError};

/// Submit `request` and report every distinct progress message until the job
/// reaches a terminal state, which is returned.
pub async fn follow<F>(service: &DownloadService, request: DownloadRequest, mut on_update: F) -> Result<Job, JobError>
where
    F: FnMut(&Job),
{
    // Subscribe first so the pending event is not missed
    let mut events = service.subscribe();
    let job_id = service.submit(request)?;
    let mut last_text: Option<String> = None;

    loop {
        let job = match events.recv().await {
            Ok(event) if event.job.id == job_id => event.job,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Event stream lagged, reading snapshot");
                service
                    .query(&job_id)
                    .ok_or_else(|| JobError::Internal(format!("job {} disappeared", job_id)))?
            }
            Err(RecvError::Closed) => return Err(JobError::Internal("job event stream closed".to_string())),
        };

        if last_text.as_deref() != Some(job.progress_text.as_str()) {
            on_update(&job);
            last_text = Some(job.progress_text.clone());
        }

        if job.status.is_terminal() {
            return Ok(job);
        }
    }
}

/// `[HH:MM:SS] message` in local time
pub fn format_line(job: &Job) -> String {
    format!("[{}] {}", Local::now().format("%H:%M:%S"), job.progress_text)
}
