//! Media extraction backends
//!
//! The crate never parses media itself. Probing and downloading are delegated
//! to an [`Extractor`], which reports progress through a synchronous callback
//! so every event is applied before the engine moves on.
//!
//! - [`YtDlpExtractor`] drives the `yt-dlp` executable
//! - [`MockExtractor`] replays a scripted sequence of events (tests)

pub mod mock;
mod types;
mod ytdlp;

pub use mock::{MockExtractor, Step};
pub use types::{DownloadOptions, MediaInfo, RawProgress};
pub use ytdlp::YtDlpExtractor;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Failed { code: Option<i32>, message: String },

    #[error("unreadable extractor output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    #[error("extractor returned no title or id")]
    EmptyMetadata,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Progress sink handed to [`Extractor::download`]
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(RawProgress) + Send);

#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;

    /// Resolve metadata without downloading anything
    async fn probe(&self, url: &str, options: &DownloadOptions) -> Result<MediaInfo>;

    /// Transfer the media into `destination`, reporting progress in emission order
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> Result<()>;

    async fn health(&self) -> bool {
        true
    }
}
