use super::models::Config;
use thiserror::Error;

/// Hard ceiling for `server.max_payload_bytes`; a submission is a URL and a format
pub const MAX_PAYLOAD_LIMIT: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("max_payload_bytes ({actual}) exceeds limit of 1MB ({limit})")]
    PayloadLimitTooLarge { actual: u64, limit: u64 },

    #[error("max_payload_bytes must be positive")]
    PayloadLimitZero,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("worker.event_buffer must be positive")]
    InvalidEventBuffer,

    #[error("Retention setting must be positive: {field} = {value}")]
    InvalidRetention { field: &'static str, value: u64 },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_download(config)?;
    validate_worker(config)?;
    validate_retention(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let actual = config.server.max_payload_bytes.as_u64();

    if actual == 0 {
        return Err(ValidationError::PayloadLimitZero);
    }

    if actual > MAX_PAYLOAD_LIMIT {
        return Err(ValidationError::PayloadLimitTooLarge {
            actual,
            limit: MAX_PAYLOAD_LIMIT,
        });
    }

    Ok(())
}

fn validate_download(config: &Config) -> Result<(), ValidationError> {
    let required = [
        ("download.format", config.download.format.as_str()),
        ("download.output_template", config.download.output_template.as_str()),
        ("extractor.binary", config.extractor.binary.as_str()),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField { field });
        }
    }

    if config.download.destination_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyField {
            field: "download.destination_dir",
        });
    }

    Ok(())
}

fn validate_worker(config: &Config) -> Result<(), ValidationError> {
    if config.worker.event_buffer == 0 {
        return Err(ValidationError::InvalidEventBuffer);
    }
    Ok(())
}

/// TTL and sweep interval only matter while retention is enabled
fn validate_retention(config: &Config) -> Result<(), ValidationError> {
    if !config.retention.enabled {
        return Ok(());
    }

    if config.retention.job_ttl_secs == 0 {
        return Err(ValidationError::InvalidRetention {
            field: "job_ttl_secs",
            value: 0,
        });
    }

    if config.retention.sweep_interval_secs == 0 {
        return Err(ValidationError::InvalidRetention {
            field: "sweep_interval_secs",
            value: 0,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_payload_limit() {
        let mut config = Config::default();
        config.server.max_payload_bytes = ByteSize(10 * 1024 * 1024);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::PayloadLimitTooLarge { .. })
        ));

        config.server.max_payload_bytes = ByteSize(0);
        assert!(matches!(validate(&config), Err(ValidationError::PayloadLimitZero)));
    }

    #[test]
    fn test_empty_format() {
        let mut config = Config::default();
        config.download.format = "  ".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyField { field: "download.format" })
        ));
    }

    #[test]
    fn test_empty_destination() {
        let mut config = Config::default();
        config.download.destination_dir = PathBuf::new();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyField { field: "download.destination_dir" })
        ));
    }

    #[test]
    fn test_zero_event_buffer() {
        let mut config = Config::default();
        config.worker.event_buffer = 0;

        assert!(matches!(validate(&config), Err(ValidationError::InvalidEventBuffer)));
    }

    #[test]
    fn test_zero_retention_ttl() {
        let mut config = Config::default();
        config.retention.job_ttl_secs = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidRetention { field: "job_ttl_secs", .. })
        ));

        config.retention.enabled = false;
        assert!(validate(&config).is_ok());
    }
}
