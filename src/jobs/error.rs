use thiserror::Error;

use super::model::{JobId, JobStatus};

/// Why a job was rejected or failed
#[derive(Debug, Error)]
pub enum JobError {
    /// Bad request; raised by `submit` before any job exists
    #[error("{0}")]
    Validation(String),

    #[error("Could not extract media information: {0}")]
    Metadata(String),

    #[error("Download failed: {0}")]
    Transfer(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Validation(_) => "validation",
            JobError::Metadata(_) => "metadata",
            JobError::Transfer(_) => "transfer",
            JobError::Internal(_) => "internal",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no job registered under id {0}")]
    UnknownJob(JobId),

    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}
