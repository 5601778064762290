//! Fixed fallback sequence of simulated clients used when a site blocks
//! bot-looking metadata requests.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::DownloaderError;
use crate::info::VideoInfo;
use crate::options::{DownloadOptions, ExtractorArgs};
use crate::platform::Platform;
use crate::ytdlp::YtDlp;

const ANDROID_UA: &str = "com.google.android.youtube/17.36.4 (Linux; U; Android 12; GB) gzip";
const IOS_UA: &str = "com.google.ios.youtube/17.36.4 (iPhone14,3; U; CPU iOS 15_6 like Mac OS X)";
const MAC_CHROME_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const YOUTUBE_CLIENT_VERSION: &str = "17.36.4";

/// One client emulation layered over the base options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionAttempt {
    pub label: &'static str,
    /// Replaces the base extractor args when set.
    pub extractor_args: Option<ExtractorArgs>,
    /// Merged over the base headers.
    pub headers: Vec<(String, String)>,
}

impl ExtractionAttempt {
    /// Uses the base options unchanged.
    pub fn passthrough(label: &'static str) -> Self {
        Self {
            label,
            extractor_args: None,
            headers: Vec::new(),
        }
    }
}

impl Platform {
    pub fn attempts(self) -> Vec<ExtractionAttempt> {
        match self {
            Platform::YouTube => vec![
                ExtractionAttempt {
                    label: "android client",
                    extractor_args: Some(
                        ExtractorArgs::new("youtube")
                            .param("player_client", &["android"])
                            .param("skip", &["webpage"]),
                    ),
                    headers: headers(&[
                        ("User-Agent", ANDROID_UA),
                        ("X-YouTube-Client-Name", "3"),
                        ("X-YouTube-Client-Version", YOUTUBE_CLIENT_VERSION),
                    ]),
                },
                ExtractionAttempt {
                    label: "ios client",
                    extractor_args: Some(
                        ExtractorArgs::new("youtube")
                            .param("player_client", &["ios"])
                            .param("skip", &["webpage"]),
                    ),
                    headers: headers(&[
                        ("User-Agent", IOS_UA),
                        ("X-YouTube-Client-Name", "5"),
                        ("X-YouTube-Client-Version", YOUTUBE_CLIENT_VERSION),
                    ]),
                },
                ExtractionAttempt {
                    label: "desktop web",
                    extractor_args: None,
                    headers: headers(&[("User-Agent", MAC_CHROME_UA)]),
                },
            ],
            Platform::TikTok => vec![ExtractionAttempt::passthrough("default")],
        }
    }
}

fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Metadata from the first attempt that worked, plus the options that got it.
#[derive(Debug)]
pub struct Extraction {
    pub info: VideoInfo,
    /// 1-based position in the attempt list.
    pub attempt: usize,
    pub options: DownloadOptions,
}

/// Tries every attempt in order, each derived from the untouched `base`.
/// Returns the last attempt's error when none succeeds.
pub async fn extract_with_fallback(
    ytdlp: &YtDlp,
    url: &str,
    base: &DownloadOptions,
    attempts: &[ExtractionAttempt],
    timeout: Duration,
) -> Result<Extraction, DownloaderError> {
    let total = attempts.len();
    let mut last_error = None;

    for (index, attempt) in attempts.iter().enumerate() {
        let number = index + 1;
        info!("Extraction attempt {number}...");
        debug!(client = attempt.label, "extraction attempt {number}");
        let options = base.with_attempt(attempt);
        debug!(user_agent = ?options.header("User-Agent"), "attempt options");

        match ytdlp.extract_info(url, &options, timeout).await {
            Ok(info) => {
                info!("Video information extracted successfully using method {number}!");
                return Ok(Extraction {
                    info,
                    attempt: number,
                    options,
                });
            }
            Err(err) => {
                warn!("Attempt {number} failed: {err}");
                if number < total {
                    info!("Trying next method...");
                }
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        DownloaderError::Failed(
            "All extraction methods failed. The site may be blocking this IP or the video is unavailable."
                .to_string(),
        )
    }))
}
