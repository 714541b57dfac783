//! Configuration management for grabbox
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. `.env` file in the working directory (loaded with `dotenvy`)
//! 4. Process environment variables
//!
//! The `.env` file only fills variables the process environment does not
//! already set, and it is read before `GRABBOX_CONFIG` is resolved, so it can
//! also choose the configuration file.
//!
//! # Environment Variables
//!
//! Any key can be overridden with `GRABBOX__<section>__<key>`, e.g.
//! - `GRABBOX__SERVER__BIND_ADDR=127.0.0.1:9000`
//! - `GRABBOX__DOWNLOAD__DESTINATION_DIR=/srv/media`
//! - `GRABBOX__WORKER__MAX_CONCURRENT_JOBS=4`
//!
//! # Configuration File
//!
//! Read from `config/grabbox.toml` unless `GRABBOX_CONFIG` points elsewhere.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    Config, DownloadConfig, ExtractorConfig, RetentionConfig, ServerConfig, TelemetryConfig,
    WorkerConfig,
};
pub use validation::{MAX_PAYLOAD_LIMIT, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load and validate configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("grabbox.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:8000"
max_payload_bytes = "64KB"

[download]
destination_dir = "/data/downloads"
format = "best"
no_check_certificate = true
no_playlist = true
user_agent = "grabbox-test/1.0"
output_template = "%(title)s [%(id)s].%(ext)s"

[extractor]
binary = "/usr/local/bin/yt-dlp"

[worker]
max_concurrent_jobs = 0
event_buffer = 64

[retention]
enabled = true
job_ttl_secs = 3600
sweep_interval_secs = 60

[telemetry]
log_filter = "grabbox=debug,tower_http=info"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.extractor.binary, "/usr/local/bin/yt-dlp");
        assert_eq!(config.worker.event_buffer, 64);
        assert_eq!(config.retention.sweep_interval_secs, 60);
        assert_eq!(config.telemetry.log_filter, "grabbox=debug,tower_http=info");

        let options = config.download.options(None);
        assert_eq!(options.user_agent.as_deref(), Some("grabbox-test/1.0"));
        assert_eq!(options.output_template, "%(title)s [%(id)s].%(ext)s");
    }

    #[test]
    fn test_validation_rejects_loaded_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("grabbox.toml");

        fs::write(&config_path, "[worker]\nevent_buffer = 0\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError(ValidationError::InvalidEventBuffer))
        ));
    }
}
