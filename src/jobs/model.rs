use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::extractor::DownloadOptions;

/// Opaque job identifier (UUIDv7, so ids sort by creation time)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Downloading,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Position along the forward path; `Error` sits outside it
    fn rank(self) -> Option<u8> {
        match self {
            JobStatus::Pending => Some(0),
            JobStatus::Downloading => Some(1),
            JobStatus::Processing => Some(2),
            JobStatus::Completed => Some(3),
            JobStatus::Error => None,
        }
    }

    /// Forward moves (including staying put) and `Error` from any live state
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(next)) => next >= current,
            (None, Some(_)) => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a worker needs to run one job
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub url: String,
    pub destination_dir: PathBuf,
    pub options: DownloadOptions,
}

/// One download attempt and its latest known state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub progress_text: String,
    pub title: Option<String>,
    pub media_id: Option<String>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    /// Bytes per second
    pub speed: Option<f64>,
    pub error_detail: Option<String>,
    pub url: String,
    pub destination_dir: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn pending(id: JobId, request: &JobRequest) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Pending,
            progress_text: "Starting download...".to_string(),
            title: None,
            media_id: None,
            downloaded_bytes: None,
            total_bytes: None,
            speed: None,
            error_detail: None,
            url: request.url.clone(),
            destination_dir: request.destination_dir.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Download progress in `[0, 100]`, or `None` when it cannot be known
    pub fn percent(&self) -> Option<f64> {
        if self.status != JobStatus::Downloading {
            return None;
        }
        percent_of(self.downloaded_bytes.unwrap_or(0), self.total_bytes)
    }

    /// Merge an update into this job.
    ///
    /// Telemetry survives only while downloading and `error_detail` only in
    /// the error state; `title` and `media_id` are never cleared.
    pub(crate) fn apply(&mut self, update: JobUpdate) {
        let downloading = update.status == JobStatus::Downloading;
        let failed = update.status == JobStatus::Error;

        self.status = update.status;
        self.progress_text = update.progress_text;
        if update.title.is_some() {
            self.title = update.title;
        }
        if update.media_id.is_some() {
            self.media_id = update.media_id;
        }
        self.downloaded_bytes = update.downloaded_bytes.filter(|_| downloading);
        self.total_bytes = update.total_bytes.filter(|_| downloading);
        self.speed = update.speed.filter(|_| downloading);
        self.error_detail = update.error_detail.filter(|_| failed);
        self.updated_at = Utc::now();
    }
}

/// Percentage of `total`; indeterminate when the total is unknown or zero
pub fn percent_of(downloaded: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => Some((downloaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0)),
        _ => None,
    }
}

/// Replacement for a job's mutable fields
#[derive(Debug, Clone, PartialEq)]
pub struct JobUpdate {
    pub status: JobStatus,
    pub progress_text: String,
    pub title: Option<String>,
    pub media_id: Option<String>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub speed: Option<f64>,
    pub error_detail: Option<String>,
}

impl JobUpdate {
    pub fn new(status: JobStatus, progress_text: impl Into<String>) -> Self {
        Self {
            status,
            progress_text: progress_text.into(),
            title: None,
            media_id: None,
            downloaded_bytes: None,
            total_bytes: None,
            speed: None,
            error_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            error_detail: Some(detail.clone()),
            ..Self::new(JobStatus::Error, format!("Error: {}", detail))
        }
    }

    pub fn with_media(mut self, title: Option<String>, media_id: Option<String>) -> Self {
        self.title = title;
        self.media_id = media_id;
        self
    }

    /// Same state and text as `job`, telemetry included
    pub fn unchanged(job: &Job) -> Self {
        Self {
            status: job.status,
            progress_text: job.progress_text.clone(),
            title: None,
            media_id: None,
            downloaded_bytes: job.downloaded_bytes,
            total_bytes: job.total_bytes,
            speed: job.speed,
            error_detail: job.error_detail.clone(),
        }
    }
}

/// Published after every accepted registry write
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub job: Job,
}
