//! Error types shared by the fetch pipeline.
//!
//! Configuration and filesystem plumbing stays on `anyhow`; the downloader
//! gets its own enum so records can tell a yt-dlp failure apart from
//! everything else.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures raised while driving the external downloader.
#[derive(Debug, Error)]
pub enum DownloaderError {
    /// The program could not be started at all.
    #[error("{} is not installed or not in PATH: {source}", program.display())]
    NotInstalled {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// `--version` ran but reported a failure.
    #[error("{} is installed but returned a failure status", program.display())]
    Unhealthy { program: PathBuf },
    /// yt-dlp exited unsuccessfully; carries its most relevant stderr line.
    #[error("{0}")]
    Failed(String),
    #[error("metadata extraction timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not parse yt-dlp metadata: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("I/O error while talking to yt-dlp: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloaderError {
    /// Whether the failure came out of yt-dlp itself, as opposed to the
    /// plumbing around it.
    pub fn is_download_error(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Timeout(_))
    }
}

/// Outcome of a failed job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Bad invocation. Reported and exits non-zero without leaving a record.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Downloader(#[from] DownloaderError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JobError {
    pub fn writes_record(&self) -> bool {
        !matches!(self, Self::Usage(_))
    }
}
