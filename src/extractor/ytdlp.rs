//! `yt-dlp` child-process backend
//!
//! Metadata comes from `--dump-single-json`. Downloads run with `--newline`
//! and a progress template that prints the engine's progress dictionary as one
//! JSON object per line, prefixed with [`PROGRESS_MARKER`]. Output is decoded
//! lossily, since yt-dlp prints titles in the locale encoding.
//!
//! Multi-stream formats (`bestvideo+bestaudio`) report one `downloading` series
//! per stream, each closed by `finished`. Jobs advance to `processing` after
//! the first stream, so later series are dropped by the registry.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use super::{DownloadOptions, Extractor, ExtractorError, MediaInfo, ProgressCallback, RawProgress, Result};
use crate::config::ExtractorConfig;

const PROGRESS_MARKER: &str = "grabbox-progress ";
const STDERR_TAIL_LINES: usize = 20;

pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.config.binary);
        command.stdin(Stdio::null()).kill_on_drop(true);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> ExtractorError {
        ExtractorError::Spawn {
            program: self.config.binary.clone(),
            source,
        }
    }
}

/// Flags shared by probe and download
fn network_args(options: &DownloadOptions) -> Vec<String> {
    let mut args = Vec::new();
    if options.no_check_certificate {
        args.push("--no-check-certificates".to_string());
    }
    if options.no_playlist {
        args.push("--no-playlist".to_string());
    }
    if let Some(user_agent) = &options.user_agent {
        args.push("--add-headers".to_string());
        args.push(format!("User-Agent:{}", user_agent));
    }
    args
}

fn download_args(url: &str, destination: &Path, options: &DownloadOptions) -> Vec<String> {
    let mut args = network_args(options);
    args.extend([
        "--newline".to_string(),
        "--progress".to_string(),
        "--progress-template".to_string(),
        format!("download:{}%(progress)j", PROGRESS_MARKER),
        "-f".to_string(),
        options.format.clone(),
        "-o".to_string(),
        destination
            .join(&options.output_template)
            .to_string_lossy()
            .into_owned(),
        "--".to_string(),
        url.to_string(),
    ]);
    args
}

/// Parse one stdout line; `None` for anything that is not a progress record
fn parse_progress_line(line: &str) -> Option<RawProgress> {
    let payload = line.trim().strip_prefix(PROGRESS_MARKER.trim_end())?;
    match serde_json::from_str::<RawProgress>(payload.trim()) {
        Ok(progress) => Some(progress),
        Err(e) => {
            warn!(error = %e, "Malformed progress line from yt-dlp");
            None
        }
    }
}

fn parse_probe_output(stdout: &[u8]) -> Result<MediaInfo> {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() || text == "null" {
        return Err(ExtractorError::EmptyMetadata);
    }

    let info: MediaInfo = serde_json::from_str(text)?;
    if info.is_empty() {
        return Err(ExtractorError::EmptyMetadata);
    }
    Ok(info)
}

/// Next line without its terminator, or `None` at end of stream
async fn next_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf[..]);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Pick the most useful line from stderr, preferring yt-dlp's `ERROR:` lines
fn failure_message<'a>(lines: impl Iterator<Item = &'a str>) -> Option<String> {
    let lines: Vec<&str> = lines.map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str, options: &DownloadOptions) -> Result<MediaInfo> {
        debug!(url, "Probing media metadata");

        let output = self
            .command()
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .args(network_args(options))
            .arg("--")
            .arg(url)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractorError::Failed {
                code: output.status.code(),
                message: failure_message(stderr.lines())
                    .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status)),
            });
        }

        parse_probe_output(&output.stdout)
    }

    async fn download(
        &self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
        on_progress: ProgressCallback<'_>,
    ) -> Result<()> {
        let args = download_args(url, destination, options);
        debug!(url, destination = %destination.display(), "Starting yt-dlp download");

        let mut child = self
            .command()
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractorError::Io(std::io::Error::other("stdout not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractorError::Io(std::io::Error::other("stderr not captured")))?;

        // A full stderr pipe would stall the child, so drain it alongside stdout
        let stderr_tail = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            while let Ok(Some(line)) = next_lossy_line(&mut reader, &mut buf).await {
                trace!(line = %line, "yt-dlp stderr");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail
        });

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        while let Some(line) = next_lossy_line(&mut reader, &mut buf).await? {
            match parse_progress_line(&line) {
                Some(progress) => on_progress(progress),
                None => trace!(line = %line, "yt-dlp stdout"),
            }
        }

        let status = child.wait().await?;
        let tail = stderr_tail.await.unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        Err(ExtractorError::Failed {
            code: status.code(),
            message: failure_message(tail.iter().map(String::as_str))
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status)),
        })
    }

    async fn health(&self) -> bool {
        match self.command().arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(e) => {
                warn!(binary = %self.config.binary, error = %e, "yt-dlp health check failed");
                false
            }
        }
    }
}
