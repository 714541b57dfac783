//! Job tracking core
//!
//! A [`Job`] is created `pending` by [`DownloadService::submit`], mutated only
//! by its worker through the [`JobRegistry`], and read by any number of
//! observers through snapshots or the [`JobEvent`] stream.

mod error;
mod model;
mod registry;
pub mod retention;
mod service;
pub mod translator;
mod validation;

pub use error::{JobError, RegistryError};
pub use model::{Job, JobEvent, JobId, JobRequest, JobStatus, JobUpdate, percent_of};
pub use registry::JobRegistry;
pub use service::{DownloadRequest, DownloadService};
pub use translator::{strip_terminal_codes, translate};
pub use validation::{INVALID_URL, NO_URL, validate_url};
