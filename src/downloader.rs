//! External media downloader adapter.
//!
//! Invokes yt-dlp (or a compatible tool) as a child process and hands the
//! resulting file to the caller as a [`MediaJob`], an RAII guard that
//! removes the file when dropped. The invocation is awaited to completion;
//! a slow download stalls the one message being handled, by contract.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

/// How much captured stderr to surface in failure messages
const STDERR_SNIPPET_LEN: usize = 240;

/// Errors from the downloader adapter
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to launch downloader: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("downloader failed: {0}")]
    Failed(String),
    #[error("downloader reported success but produced no output file")]
    MissingOutput,
}

/// Target media kind for one download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// File extension the downloader is asked to produce
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Audio => "mp3",
            Self::Video => "mp4",
        }
    }

    /// Pick the target kind for a URL: Instagram links carry reels and are
    /// fetched as video, everything else is treated as a music source.
    pub fn for_url(url: &str) -> Self {
        if url.contains("instagram.com") {
            Self::Video
        } else {
            Self::Audio
        }
    }
}

/// One downloaded file, removed from disk when the job is dropped.
///
/// Ownership of the job is the ownership of the file: every exit path of a
/// handler that acquired media releases it, including delivery failures.
#[derive(Debug)]
pub struct MediaJob {
    path: PathBuf,
    kind: MediaKind,
}

impl MediaJob {
    /// Take ownership of a downloaded file.
    pub const fn new(path: PathBuf, kind: MediaKind) -> Self {
        Self { path, kind }
    }

    /// Local path of the downloaded file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Media kind the file was produced as
    pub const fn kind(&self) -> MediaKind {
        self.kind
    }
}

impl Drop for MediaJob {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove media file");
            }
        }
    }
}

/// Media acquisition seam for the router
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `url` as the given kind, returning the owned local file.
    async fn fetch(&self, url: &str, kind: MediaKind) -> Result<MediaJob, DownloadError>;
}

/// Adapter around the external yt-dlp command-line tool
pub struct YtDlp {
    bin: String,
    download_dir: PathBuf,
}

impl YtDlp {
    /// Create an adapter invoking `bin`, staging files under `download_dir`.
    pub fn new(bin: &str, download_dir: PathBuf) -> Self {
        Self {
            bin: bin.to_string(),
            download_dir,
        }
    }

    /// Fixed argument template per target kind.
    ///
    /// The output template ends in `.%(ext)s` so the tool writes the final
    /// container extension itself; the expected path is derived from the
    /// same stem.
    fn args_for(kind: MediaKind, output_template: &str, url: &str) -> Vec<String> {
        let mut args: Vec<String> = match kind {
            MediaKind::Audio => ["--extract-audio", "--audio-format", "mp3"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            MediaKind::Video => ["-f", "mp4"].iter().map(ToString::to_string).collect(),
        };
        args.extend([
            "--no-warnings".to_string(),
            "-o".to_string(),
            output_template.to_string(),
            url.to_string(),
        ]);
        args
    }

    /// Remove leftovers (partial downloads, unconverted originals) for a
    /// failed job, matched by the unique filename stem.
    fn cleanup_partials(&self, stem: &str) {
        let Ok(entries) = std::fs::read_dir(&self.download_dir) else {
            return;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with(stem) {
                if let Err(e) = std::fs::remove_file(entry.path()) {
                    warn!(file = %name.to_string_lossy(), error = %e, "failed to remove partial download");
                }
            }
        }
    }
}

#[async_trait]
impl MediaFetcher for YtDlp {
    async fn fetch(&self, url: &str, kind: MediaKind) -> Result<MediaJob, DownloadError> {
        let stem = Uuid::new_v4().to_string();
        let output_template = self
            .download_dir
            .join(format!("{stem}.%(ext)s"))
            .to_string_lossy()
            .into_owned();
        let expected = self
            .download_dir
            .join(format!("{stem}.{}", kind.extension()));

        let args = Self::args_for(kind, &output_template, url);
        debug!(bin = %self.bin, ?args, "invoking downloader");

        let output = Command::new(&self.bin).args(&args).output().await?;

        if !output.status.success() {
            self.cleanup_partials(&stem);
            let stderr = String::from_utf8_lossy(&output.stderr)
                .trim()
                .chars()
                .take(STDERR_SNIPPET_LEN)
                .collect::<String>();
            return Err(DownloadError::Failed(stderr));
        }

        if !expected.exists() {
            self.cleanup_partials(&stem);
            return Err(DownloadError::MissingOutput);
        }

        Ok(MediaJob::new(expected, kind))
    }
}
