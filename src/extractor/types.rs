use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options passed through to the extraction engine untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// Format selector, e.g. `best` or `bestvideo+bestaudio/best`
    pub format: String,
    pub no_check_certificate: bool,
    pub no_playlist: bool,
    pub user_agent: Option<String>,
    /// File name template relative to the destination directory
    pub output_template: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            format: "best".to_string(),
            no_check_certificate: true,
            no_playlist: true,
            user_agent: None,
            output_template: "%(title)s.%(ext)s".to_string(),
        }
    }
}

/// Metadata resolved by a probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl MediaInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.as_deref().is_none_or(str::is_empty) && self.title.as_deref().is_none_or(str::is_empty)
    }
}

/// One progress record as emitted by the engine.
///
/// Only `status` is guaranteed. Numbers arrive as integers or floats depending
/// on the engine, so they are all read as `f64`. Anything not named here is
/// kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawProgress {
    pub status: String,
    #[serde(default)]
    pub downloaded_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default, rename = "_percent_str")]
    pub percent_str: Option<String>,
    #[serde(default, rename = "_speed_str")]
    pub speed_str: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawProgress {
    pub fn downloading(downloaded: u64, total: Option<u64>, speed: Option<f64>) -> Self {
        Self {
            status: "downloading".to_string(),
            downloaded_bytes: Some(downloaded as f64),
            total_bytes: total.map(|t| t as f64),
            speed,
            ..Self::default()
        }
    }

    pub fn finished() -> Self {
        Self {
            status: "finished".to_string(),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_progress_accepts_engine_json() {
        let raw: RawProgress = serde_json::from_str(
            r#"{
                "status": "downloading",
                "downloaded_bytes": 1024,
                "total_bytes_estimate": 4096.5,
                "speed": null,
                "_percent_str": "\u001b[0;94m 25.0%\u001b[0m",
                "eta": 3,
                "fragment_index": 2
            }"#,
        )
        .unwrap();

        assert_eq!(raw.status, "downloading");
        assert_eq!(raw.downloaded_bytes, Some(1024.0));
        assert_eq!(raw.total_bytes, None);
        assert_eq!(raw.total_bytes_estimate, Some(4096.5));
        assert_eq!(raw.speed, None);
        assert!(raw.percent_str.unwrap().contains("25.0%"));
        assert_eq!(raw.extra.get("eta"), Some(&Value::from(3)));
        assert!(raw.extra.contains_key("fragment_index"));
    }

    #[test]
    fn media_info_emptiness() {
        assert!(MediaInfo::default().is_empty());
        assert!(!MediaInfo::new("abc", "A title").is_empty());

        let untitled: MediaInfo = serde_json::from_str(r#"{"id": "xyz"}"#).unwrap();
        assert!(!untitled.is_empty());
        assert_eq!(untitled.title, None);
    }
}
