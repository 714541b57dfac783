use crate::extractor::DownloadOptions;
use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Upper bound for `POST /download` bodies
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_max_payload_bytes() -> ByteSize {
    ByteSize(64 * 1024)
}

/// Defaults applied to every submitted download
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub no_check_certificate: bool,
    #[serde(default = "default_true")]
    pub no_playlist: bool,
    /// Empty string sends the engine's own user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: Option<String>,
    #[serde(default = "default_output_template")]
    pub output_template: String,
}

impl DownloadConfig {
    /// Engine options for one request, with an optional per-request format
    pub fn options(&self, format: Option<&str>) -> DownloadOptions {
        DownloadOptions {
            format: format.unwrap_or(&self.format).to_string(),
            no_check_certificate: self.no_check_certificate,
            no_playlist: self.no_playlist,
            user_agent: self.user_agent.clone().filter(|ua| !ua.is_empty()),
            output_template: self.output_template.clone(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            destination_dir: default_destination_dir(),
            format: default_format(),
            no_check_certificate: true,
            no_playlist: true,
            user_agent: default_user_agent(),
            output_template: default_output_template(),
        }
    }
}

fn default_destination_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

fn default_format() -> String {
    "best".to_string()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> Option<String> {
    Some(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .to_string(),
    )
}

fn default_output_template() -> String {
    "%(title)s.%(ext)s".to_string()
}

/// Extraction engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractorConfig {
    /// Executable name or path
    #[serde(default = "default_binary")]
    pub binary: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
        }
    }
}

fn default_binary() -> String {
    "yt-dlp".to_string()
}

/// Worker scheduling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// 0 means no limit
    #[serde(default)]
    pub max_concurrent_jobs: usize,
    /// Capacity of the job event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl WorkerConfig {
    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent_jobs > 0).then_some(self.max_concurrent_jobs)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 0,
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_event_buffer() -> usize {
    256
}

/// Retention of finished jobs in the registry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl RetentionConfig {
    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            job_ttl_secs: default_job_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_job_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.server.max_payload_bytes.as_u64(), 64 * 1024);
        assert_eq!(config.download.format, "best");
        assert!(config.download.destination_dir.ends_with("Downloads") || config.download.destination_dir.ends_with("downloads"));
        assert_eq!(config.worker.concurrency_limit(), None);
        assert_eq!(config.retention.job_ttl(), Duration::from_secs(86400));
    }

    #[test]
    fn test_download_options_override_format() {
        let download = DownloadConfig::default();

        assert_eq!(download.options(None).format, "best");
        let options = download.options(Some("bestaudio"));
        assert_eq!(options.format, "bestaudio");
        assert!(options.no_check_certificate);
        assert!(options.user_agent.as_deref().unwrap().starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_concurrency_limit() {
        let worker = WorkerConfig {
            max_concurrent_jobs: 4,
            ..WorkerConfig::default()
        };
        assert_eq!(worker.concurrency_limit(), Some(4));
    }
}
