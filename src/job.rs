//! One fetch from start to finish: validate, extract with fallback, download,
//! and leave a record behind either way.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::JobConfig;
use crate::download_type::DownloadType;
use crate::error::JobError;
use crate::options::DownloadOptions;
use crate::platform::Platform;
use crate::progress::{ProgressWriter, scale_download_percent, update_progress};
use crate::records::{ErrorRecord, MetadataRecord, write_error_record, write_metadata_record};
use crate::strategy::extract_with_fallback;
use crate::ytdlp::{DownloadEvent, YtDlp};

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub record_path: PathBuf,
    /// Final media file, when yt-dlp reported where it put it.
    pub media_path: Option<PathBuf>,
    /// 1-based index of the extraction attempt that worked.
    pub attempt: usize,
}

/// Runs the whole pipeline for `config.video_url`. Once the output directory
/// exists every failure also leaves an error record there.
pub async fn run(platform: Platform, config: &JobConfig) -> Result<JobOutcome, JobError> {
    if !platform.accepts_url(&config.video_url) {
        return Err(JobError::Usage(format!(
            "Invalid {platform} URL: {}",
            config.video_url
        )));
    }

    match platform {
        Platform::YouTube => info!("Starting download for: {}", config.video_url),
        Platform::TikTok => info!("Starting TikTok download for: {}", config.video_url),
    }
    info!("Download type: {}", config.download_type);
    info!("Timestamp: {}", config.timestamp);

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    let progress = config.progress_file.clone().map(ProgressWriter::new);
    match fetch(platform, config, progress.as_ref()).await {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            let message = platform.failure_message(&err);
            update_progress(progress.as_ref(), 100, &format!("Download failed: {message}"));
            let record = ErrorRecord::failed(
                platform,
                &config.video_url,
                &config.download_type,
                &config.timestamp,
                message,
            );
            match write_error_record(
                &config.output_dir,
                platform,
                &record,
                Local::now().naive_local(),
            ) {
                Ok(path) => info!("Error record written to {}", path.display()),
                Err(write_err) => warn!("could not write error record: {write_err:#}"),
            }
            Err(err)
        }
    }
}

async fn fetch(
    platform: Platform,
    config: &JobConfig,
    progress: Option<&ProgressWriter>,
) -> Result<JobOutcome, JobError> {
    update_progress(progress, 5, "Preparing download");
    let download_type = DownloadType::parse(&config.download_type);
    debug!("resolved download mode: {download_type}");
    let base = DownloadOptions::for_platform(platform, download_type, &config.output_dir);
    let ytdlp = YtDlp::new(&config.ytdlp_program);

    match platform {
        Platform::YouTube => info!("Attempting to extract video information..."),
        Platform::TikTok => info!("Extracting TikTok video information..."),
    }
    let version = ytdlp.version().await?;
    info!("Using yt-dlp version: {version}");

    update_progress(progress, 15, "Extracting video information");
    let extraction = extract_with_fallback(
        &ytdlp,
        &config.video_url,
        &base,
        &platform.attempts(),
        config.attempt_timeout,
    )
    .await?;

    let summary = extraction.info.summarize(platform);
    info!("Title: {}", summary.title);
    info!("Duration: {} seconds", summary.duration);
    match platform {
        Platform::YouTube => info!("Uploader: {}", summary.uploader),
        Platform::TikTok => info!("Creator: {}", summary.uploader),
    }
    info!("Video ID: {}", summary.video_id);
    if platform.checks_availability() {
        info!("Availability: {}", summary.availability);
        if let Some(restriction) = summary.restriction() {
            return Err(anyhow!("Video is {restriction} and cannot be downloaded").into());
        }
    }

    info!("Starting download...");
    update_progress(progress, 30, "Downloading media");
    let media_path = ytdlp
        .download(&config.video_url, &extraction.options, |event| match event {
            DownloadEvent::Progress {
                percent,
                speed,
                fraction,
            } => {
                info!("Downloading... {percent} at {speed}");
                if let Some(fraction) = fraction {
                    update_progress(
                        progress,
                        scale_download_percent(*fraction),
                        &format!("Downloading media ({percent})"),
                    );
                }
            }
            DownloadEvent::Finished { path } => {
                info!("Download completed: {}", path.display());
            }
        })
        .await?;

    let record = MetadataRecord::completed(
        platform,
        &config.video_url,
        &summary,
        &config.download_type,
        &config.timestamp,
    );
    let record_path = write_metadata_record(&config.output_dir, platform, &record)?;
    update_progress(progress, 100, "Download complete");
    match platform {
        Platform::YouTube => info!("Download completed successfully!"),
        Platform::TikTok => info!("TikTok download completed successfully!"),
    }

    Ok(JobOutcome {
        record_path,
        media_path,
        attempt: extraction.attempt,
    })
}
