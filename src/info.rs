//! The slice of yt-dlp's info JSON the fetchers care about.

use serde::Deserialize;
use serde_json::Number;

use crate::platform::Platform;

/// Partial `yt-dlp --dump-single-json` payload. Everything is optional since
/// extractors differ in what they report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Kept as the raw JSON number so records echo `42` or `42.5` unchanged.
    pub duration: Option<Number>,
    pub uploader: Option<String>,
    pub availability: Option<String>,
    pub description: Option<String>,
}

/// `VideoInfo` with the site's defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSummary {
    pub video_id: String,
    pub title: String,
    pub duration: Number,
    pub uploader: String,
    pub availability: String,
    pub description: String,
}

impl VideoInfo {
    pub fn summarize(self, platform: Platform) -> MediaSummary {
        MediaSummary {
            video_id: self
                .id
                .unwrap_or_else(|| platform.default_video_id().to_string()),
            title: self
                .title
                .unwrap_or_else(|| platform.default_title().to_string()),
            duration: self.duration.unwrap_or_else(|| Number::from(0)),
            uploader: self.uploader.unwrap_or_else(|| "Unknown".to_string()),
            availability: self
                .availability
                .unwrap_or_else(|| "unknown".to_string()),
            description: self.description.unwrap_or_default(),
        }
    }
}

impl MediaSummary {
    /// Availability value that forbids downloading, if any.
    pub fn restriction(&self) -> Option<&str> {
        Platform::is_restricted(&self.availability).then_some(self.availability.as_str())
    }
}
