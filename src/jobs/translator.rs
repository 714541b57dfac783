//! Raw engine progress -> job updates
//!
//! [`translate`] is pure: it reads the current snapshot for context (title,
//! media id) and never reorders or drops events. Missing numbers degrade to
//! indeterminate output, never to an error.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::model::{Job, JobStatus, JobUpdate, percent_of};
use crate::extractor::RawProgress;
use crate::humanize::format_speed;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ID: &str = "Unknown ID";
const NOT_AVAILABLE: &str = "N/A";

/// CSI escape sequences, plus bare `[0;94m` colour codes whose ESC byte was lost
static TERMINAL_CODES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]|\[[0-9;]*m").expect("terminal code pattern is valid")
});

/// Remove terminal colour/formatting sequences and surrounding whitespace
pub fn strip_terminal_codes(text: &str) -> String {
    TERMINAL_CODES.replace_all(text, "").trim().to_string()
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn clean_text(value: Option<&str>) -> Option<String> {
    value.map(strip_terminal_codes).filter(|s| !s.is_empty())
}

pub fn translate(current: &Job, event: &RawProgress) -> JobUpdate {
    let title = current.title.as_deref().unwrap_or(UNKNOWN_TITLE);
    let media_id = current.media_id.as_deref().unwrap_or(UNKNOWN_ID);

    match event.status.as_str() {
        "downloading" => downloading(title, media_id, event),
        "finished" => JobUpdate::new(
            JobStatus::Processing,
            format!("Download finished for [{}] {}, processing file...", media_id, title),
        ),
        "error" => {
            let detail = clean_text(event.error.as_deref()).unwrap_or_else(|| "Unknown error".to_string());
            JobUpdate {
                error_detail: Some(detail.clone()),
                ..JobUpdate::new(JobStatus::Error, format!("Download error: {}", detail))
            }
        }
        other => {
            debug!(job_id = %current.id, status = other, "Ignoring unrecognised progress status");
            JobUpdate::unchanged(current)
        }
    }
}

fn downloading(title: &str, media_id: &str, event: &RawProgress) -> JobUpdate {
    let downloaded = non_negative(event.downloaded_bytes).map(|v| v as u64).unwrap_or(0);
    let total = non_negative(event.total_bytes)
        .or_else(|| non_negative(event.total_bytes_estimate))
        .map(|v| v as u64);
    let speed = non_negative(event.speed).filter(|s| *s > 0.0);

    let percent_text = match percent_of(downloaded, total) {
        Some(percent) => format!("{:.1}%", percent),
        None => clean_text(event.percent_str.as_deref()).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };
    let speed_text = speed
        .and_then(format_speed)
        .or_else(|| clean_text(event.speed_str.as_deref()))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    JobUpdate {
        downloaded_bytes: Some(downloaded),
        total_bytes: total,
        speed,
        ..JobUpdate::new(
            JobStatus::Downloading,
            format!("Downloading [{}] {}: {} at {}", media_id, title, percent_text, speed_text),
        )
    }
}
