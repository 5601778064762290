use std::fmt;

use crate::platform::Platform;

pub const DEFAULT_DOWNLOAD_TYPE: &str = "video";
pub const AUDIO_FORMAT: &str = "mp3";
pub const AUDIO_QUALITY: &str = "192K";

/// What the caller asked for through `DOWNLOAD_TYPE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadType {
    Audio,
    Best,
    Video,
}

impl DownloadType {
    /// Unknown values fall back to a regular video download.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "audio" => DownloadType::Audio,
            "best" => DownloadType::Best,
            _ => DownloadType::Video,
        }
    }

    pub fn extracts_audio(self) -> bool {
        matches!(self, DownloadType::Audio)
    }

    /// yt-dlp `--format` selector for this mode on the given site.
    pub fn format_selector(self, platform: Platform) -> &'static str {
        match (self, platform) {
            (DownloadType::Audio, _) => "bestaudio/best",
            (DownloadType::Best, Platform::YouTube) => "best[height<=1080]",
            (DownloadType::Best, Platform::TikTok) => "best",
            (DownloadType::Video, Platform::YouTube) => {
                "best[ext=mp4][height<=720]/best[height<=720]/best"
            }
            (DownloadType::Video, Platform::TikTok) => "best[ext=mp4]/best",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DownloadType::Audio => "audio",
            DownloadType::Best => "best",
            DownloadType::Video => "video",
        };
        f.write_str(label)
    }
}
