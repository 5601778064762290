//! JSON artifacts left next to the media: one metadata record per success,
//! one error record per failure.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use serde_json::Number;
use tempfile::NamedTempFile;

use crate::info::MediaSummary;
use crate::platform::Platform;

const MAX_FILENAME_CHARS: usize = 100;

static INVALID_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// Field order is the on-disk key order.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataRecord {
    pub url: String,
    pub title: String,
    pub duration: Number,
    pub uploader: String,
    pub video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub download_type: String,
    pub timestamp: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<&'static str>,
}

impl MetadataRecord {
    pub fn completed(
        platform: Platform,
        url: &str,
        summary: &MediaSummary,
        download_type: &str,
        timestamp: &str,
    ) -> Self {
        Self {
            url: url.to_string(),
            title: summary.title.clone(),
            duration: summary.duration.clone(),
            uploader: summary.uploader.clone(),
            video_id: summary.video_id.clone(),
            description: platform
                .records_description()
                .then(|| summary.description.clone()),
            download_type: download_type.to_string(),
            timestamp: timestamp.to_string(),
            status: JobStatus::Completed,
            platform: platform.record_tag(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub url: String,
    pub download_type: String,
    pub timestamp: String,
    pub status: JobStatus,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<&'static str>,
}

impl ErrorRecord {
    pub fn failed(
        platform: Platform,
        url: &str,
        download_type: &str,
        timestamp: &str,
        error: String,
    ) -> Self {
        Self {
            url: url.to_string(),
            download_type: download_type.to_string(),
            timestamp: timestamp.to_string(),
            status: JobStatus::Failed,
            error,
            platform: platform.record_tag(),
        }
    }
}

/// Strips characters that are invalid in file names on common filesystems,
/// turns whitespace runs into `_` and caps the length.
pub fn sanitize_filename(name: &str) -> String {
    let stripped = INVALID_FILENAME_CHARS.replace_all(name, "");
    let underscored = WHITESPACE_RUN.replace_all(&stripped, "_");
    underscored.chars().take(MAX_FILENAME_CHARS).collect()
}

pub fn metadata_file_name(platform: Platform, title: &str, video_id: &str) -> String {
    let title = sanitize_filename(title);
    match platform {
        Platform::YouTube => format!("{}metadata_{title}.json", platform.record_prefix()),
        Platform::TikTok => format!("{}metadata_{title}_{video_id}.json", platform.record_prefix()),
    }
}

/// Error records are keyed by wall-clock second, so a rerun within the same
/// second replaces the earlier record.
pub fn error_file_name(platform: Platform, at: NaiveDateTime) -> String {
    format!(
        "{}error_{}.json",
        platform.record_prefix(),
        at.format("%Y%m%d_%H%M%S")
    )
}

pub fn write_metadata_record(
    dir: &Path,
    platform: Platform,
    record: &MetadataRecord,
) -> Result<PathBuf> {
    let path = dir.join(metadata_file_name(platform, &record.title, &record.video_id));
    write_json_atomic(&path, record)?;
    Ok(path)
}

pub fn write_error_record(
    dir: &Path,
    platform: Platform,
    record: &ErrorRecord,
    at: NaiveDateTime,
) -> Result<PathBuf> {
    let path = dir.join(error_file_name(platform, at));
    write_json_atomic(&path, record)?;
    Ok(path)
}

/// Pretty-prints `value` into a temp file next to `path` and renames it into
/// place, so readers only ever see complete documents.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let payload = serde_json::to_vec_pretty(value).context("serializing record")?;
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(&payload)
        .with_context(|| format!("writing {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}
