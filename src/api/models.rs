//! Wire models for the polling API.
//!
//! Clients submit with `POST /download` and poll `GET /status/{download_id}`
//! until `status` is `completed` or `error`:
//!
//! ```json
//! {
//!   "download_id": "0192b3c4-5d6e-7f80-9a1b-2c3d4e5f6a7b",
//!   "status": "downloading",
//!   "progress": "Downloading [dQw4w9WgXcQ] Some video: 42.0% at 1.2 MB/s",
//!   "percent": 42.0,
//!   "title": "Some video",
//!   "media_id": "dQw4w9WgXcQ",
//!   "downloaded_bytes": 4404019,
//!   "total_bytes": 10485760,
//!   "speed": 1258291.2,
//!   "error_detail": null,
//!   "created_at": 1760600000,
//!   "updated_at": 1760600012
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::jobs::{Job, JobStatus};
use crate::observability::MetricsSnapshot;

pub const NOT_FOUND_STATUS: &str = "not_found";
pub const NOT_FOUND_MESSAGE: &str = "Download not found";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SubmitRequest {
    /// Missing, null and empty are all reported as "No URL provided"
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DownloadAcceptedResponse {
    pub download_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobView {
    pub download_id: String,
    pub status: JobStatus,
    pub progress: String,
    pub percent: Option<f64>,
    pub title: Option<String>,
    pub media_id: Option<String>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub speed: Option<f64>,
    pub error_detail: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            download_id: job.id.to_string(),
            status: job.status,
            progress: job.progress_text.clone(),
            percent: job.percent().map(|p| (p * 10.0).round() / 10.0),
            title: job.title.clone(),
            media_id: job.media_id.clone(),
            downloaded_bytes: job.downloaded_bytes,
            total_bytes: job.total_bytes,
            speed: job.speed,
            error_detail: job.error_detail.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Body for ids the registry does not know (never seen, or already evicted)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotFoundView {
    pub status: String,
    pub progress: String,
}

impl Default for NotFoundView {
    fn default() -> Self {
        Self {
            status: NOT_FOUND_STATUS.to_string(),
            progress: NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum StatusResponse {
    Found(Box<JobView>),
    NotFound(NotFoundView),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub jobs_tracked: usize,
}
