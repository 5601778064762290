//! Optional machine-readable progress report for whoever launched the job.

use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::records::write_json_atomic;

/// Share of the bar reserved for the download itself (30..=95).
const DOWNLOAD_START: u8 = 30;
const DOWNLOAD_END: u8 = 95;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressReport<'a> {
    progress: u8,
    message: &'a str,
}

#[derive(Clone, Debug)]
pub struct ProgressWriter {
    path: PathBuf,
}

impl ProgressWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Never fails the job; problems are logged and dropped.
    pub fn write(&self, progress: u8, message: &str) {
        let report = ProgressReport {
            progress: progress.min(100),
            message,
        };
        if let Err(err) = write_json_atomic(&self.path, &report) {
            warn!("could not write progress file {}: {err:#}", self.path.display());
        }
    }
}

pub fn update_progress(progress: Option<&ProgressWriter>, percent: u8, message: &str) {
    if let Some(writer) = progress {
        writer.write(percent, message);
    }
}

/// Maps yt-dlp's own 0-100 download percentage into the download window of
/// the overall bar.
pub fn scale_download_percent(fraction: f64) -> u8 {
    let clamped = fraction.clamp(0.0, 100.0);
    let span = f64::from(DOWNLOAD_END - DOWNLOAD_START);
    DOWNLOAD_START + (clamped / 100.0 * span).round() as u8
}
