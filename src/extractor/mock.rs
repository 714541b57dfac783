//! Scripted extractor for tests and local experiments

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use super::{DownloadOptions, Extractor, ExtractorError, MediaInfo, ProgressCallback, RawProgress, Result};

/// One step of a scripted download
#[derive(Debug, Clone)]
pub enum Step {
    Emit(RawProgress),
    /// Park until the handle is notified
    Wait(Arc<Notify>),
    Fail(String),
    Panic(String),
}

#[derive(Debug, Clone)]
enum ProbeOutcome {
    Info(MediaInfo),
    Empty,
    Fail(String),
}

/// Extractor that replays a fixed probe result and download script
#[derive(Debug)]
pub struct MockExtractor {
    probe: ProbeOutcome,
    script: Vec<Step>,
    healthy: bool,
    probe_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl MockExtractor {
    /// Probe resolves to `info`; the download succeeds without emitting anything
    pub fn new(info: MediaInfo) -> Self {
        Self {
            probe: ProbeOutcome::Info(info),
            script: Vec::new(),
            healthy: true,
            probe_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_probe(message: impl Into<String>) -> Self {
        Self {
            probe: ProbeOutcome::Fail(message.into()),
            ..Self::new(MediaInfo::default())
        }
    }

    pub fn empty_probe() -> Self {
        Self {
            probe: ProbeOutcome::Empty,
            ..Self::new(MediaInfo::default())
        }
    }

    pub fn with_script(mut self, script: Vec<Step>) -> Self {
        self.script = script;
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, _url: &str, _options: &DownloadOptions) -> Result<MediaInfo> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        match &self.probe {
            ProbeOutcome::Info(info) => Ok(info.clone()),
            ProbeOutcome::Empty => Err(ExtractorError::EmptyMetadata),
            ProbeOutcome::Fail(message) => Err(ExtractorError::Failed {
                code: Some(1),
                message: message.clone(),
            }),
        }
    }

    async fn download(
        &self,
        _url: &str,
        _destination: &Path,
        _options: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> Result<()> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        for step in &self.script {
            match step {
                Step::Emit(progress) => on_progress(progress.clone()),
                Step::Wait(gate) => gate.notified().await,
                Step::Fail(message) => {
                    return Err(ExtractorError::Failed {
                        code: Some(1),
                        message: message.clone(),
                    });
                }
                Step::Panic(message) => panic!("{}", message),
            }
        }
        Ok(())
    }

    async fn health(&self) -> bool {
        self.healthy
    }
}
