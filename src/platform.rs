//! Per-site profiles. Everything that differs between the YouTube and TikTok
//! fetchers is decided here so the pipeline itself stays site-agnostic.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::JobError;

static YOUTUBE_URL_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/")
            .expect("static regex"),
        Regex::new(r"^(https?://)?(www\.)?youtu\.be/").expect("static regex"),
    ]
});

/// Access levels that yt-dlp reports for videos we are not allowed to fetch.
const RESTRICTED_AVAILABILITY: &[&str] = &["private", "premium_only", "subscriber_only"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YouTube,
    TikTok,
}

impl Platform {
    pub fn label(self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
        }
    }

    /// Value of the `platform` field in records, if the site stamps one.
    pub fn record_tag(self) -> Option<&'static str> {
        match self {
            Platform::YouTube => None,
            Platform::TikTok => Some("tiktok"),
        }
    }

    /// Prefix for record file names (`tiktok_metadata_...`).
    pub fn record_prefix(self) -> &'static str {
        match self {
            Platform::YouTube => "",
            Platform::TikTok => "tiktok_",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            Platform::YouTube => "Unknown_Video",
            Platform::TikTok => "TikTok_Video",
        }
    }

    pub fn default_video_id(self) -> &'static str {
        match self {
            Platform::YouTube => "unknown_id",
            Platform::TikTok => "unknown",
        }
    }

    /// TikTok links come in too many shapes (vm., vt., m.) to pre-validate;
    /// yt-dlp rejects the bad ones soon enough.
    pub fn accepts_url(self, url: &str) -> bool {
        match self {
            Platform::YouTube => YOUTUBE_URL_PATTERNS
                .iter()
                .any(|pattern| pattern.is_match(url)),
            Platform::TikTok => true,
        }
    }

    pub fn checks_availability(self) -> bool {
        matches!(self, Platform::YouTube)
    }

    pub fn is_restricted(availability: &str) -> bool {
        RESTRICTED_AVAILABILITY.contains(&availability)
    }

    pub fn records_description(self) -> bool {
        matches!(self, Platform::TikTok)
    }

    /// Message stored in the `error` field of a failure record.
    pub fn failure_message(self, err: &JobError) -> String {
        match self {
            Platform::YouTube => match err {
                JobError::Downloader(inner) if inner.is_download_error() => {
                    format!("yt-dlp download error: {inner}")
                }
                other => format!("General error: {other}"),
            },
            Platform::TikTok => err.to_string(),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownloaderError;
    use std::path::PathBuf;

    #[test]
    fn youtube_accepts_common_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/shorts/abc",
            "youtube.com/watch?v=abc",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/abc",
            "www.youtu.be/abc",
        ] {
            assert!(Platform::YouTube.accepts_url(url), "{url}");
        }
    }

    #[test]
    fn youtube_rejects_other_hosts_and_unanchored_matches() {
        for url in [
            "https://vimeo.com/123",
            "https://www.tiktok.com/@user/video/1",
            "https://example.com/?next=https://youtube.com/watch",
            "https://youtube.com",
            "",
        ] {
            assert!(!Platform::YouTube.accepts_url(url), "{url}");
        }
    }

    #[test]
    fn tiktok_accepts_any_url() {
        assert!(Platform::TikTok.accepts_url("https://vm.tiktok.com/ZMabc/"));
        assert!(Platform::TikTok.accepts_url("not even a url"));
    }

    #[test]
    fn restricted_availability_values() {
        assert!(Platform::is_restricted("private"));
        assert!(Platform::is_restricted("premium_only"));
        assert!(Platform::is_restricted("subscriber_only"));
        assert!(!Platform::is_restricted("public"));
        assert!(!Platform::is_restricted("unlisted"));
        assert!(!Platform::is_restricted("unknown"));
    }

    #[test]
    fn youtube_failure_messages_are_prefixed() {
        let tool = JobError::Downloader(DownloaderError::Failed("ERROR: blocked".into()));
        assert_eq!(
            Platform::YouTube.failure_message(&tool),
            "yt-dlp download error: ERROR: blocked"
        );

        let plumbing = JobError::Downloader(DownloaderError::Unhealthy {
            program: PathBuf::from("yt-dlp"),
        });
        assert_eq!(
            Platform::YouTube.failure_message(&plumbing),
            "General error: yt-dlp is installed but returned a failure status"
        );

        let other = JobError::Other(anyhow::anyhow!("Video is private and cannot be downloaded"));
        assert_eq!(
            Platform::YouTube.failure_message(&other),
            "General error: Video is private and cannot be downloaded"
        );
    }

    #[test]
    fn tiktok_failure_messages_are_bare() {
        let tool = JobError::Downloader(DownloaderError::Failed("ERROR: gone".into()));
        assert_eq!(Platform::TikTok.failure_message(&tool), "ERROR: gone");
    }
}
