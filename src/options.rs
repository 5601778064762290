//! Typed option set handed to yt-dlp, plus its rendering into command-line
//! arguments.

use std::path::Path;

use crate::download_type::{AUDIO_FORMAT, AUDIO_QUALITY, DownloadType};
use crate::platform::Platform;
use crate::strategy::ExtractionAttempt;

pub const YOUTUBE_BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const TIKTOK_BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Marker prefixes yt-dlp echoes on stdout during a download. See
/// `ytdlp::parse_download_line`.
pub const PROGRESS_MARKER: &str = "[progress]";
pub const SAVED_MARKER: &str = "[saved]";

/// `--extractor-args` for a single extractor, e.g.
/// `youtube:player_client=android,web;skip=hls,dash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorArgs {
    pub extractor: String,
    pub params: Vec<(String, Vec<String>)>,
}

impl ExtractorArgs {
    pub fn new(extractor: &str) -> Self {
        Self {
            extractor: extractor.to_string(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, values: &[&str]) -> Self {
        self.params.push((
            key.to_string(),
            values.iter().map(|value| value.to_string()).collect(),
        ));
        self
    }

    pub fn render(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|(key, values)| format!("{key}={}", values.join(",")))
            .collect::<Vec<_>>()
            .join(";");
        format!("{}:{params}", self.extractor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub output_template: String,
    pub format: String,
    pub extract_audio: bool,
    pub audio_format: String,
    pub audio_quality: String,
    pub ignore_errors: bool,
    pub verbose: bool,
    /// Ordered so the rendered command line is stable.
    pub headers: Vec<(String, String)>,
    pub extractor_args: Option<ExtractorArgs>,
    pub sleep_interval: Option<u32>,
    pub max_sleep_interval: Option<u32>,
}

impl DownloadOptions {
    /// Base option set for a site and requested mode. Media lands directly
    /// inside `output_dir`.
    pub fn for_platform(platform: Platform, download_type: DownloadType, output_dir: &Path) -> Self {
        // `%` would otherwise start an output-template field.
        let dir = output_dir.to_string_lossy().replace('%', "%%");
        let format = download_type.format_selector(platform).to_string();
        let extract_audio = download_type.extracts_audio();

        match platform {
            Platform::YouTube => Self {
                output_template: format!("{dir}/%(title)s.%(ext)s"),
                format,
                extract_audio,
                audio_format: AUDIO_FORMAT.to_string(),
                audio_quality: AUDIO_QUALITY.to_string(),
                ignore_errors: false,
                verbose: true,
                headers: owned_headers(&[
                    ("User-Agent", YOUTUBE_BROWSER_UA),
                    (
                        "Accept",
                        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
                    ),
                    ("Accept-Language", "en-US,en;q=0.5"),
                    ("Accept-Encoding", "gzip, deflate"),
                    ("DNT", "1"),
                    ("Connection", "keep-alive"),
                    ("Upgrade-Insecure-Requests", "1"),
                ]),
                extractor_args: Some(
                    ExtractorArgs::new("youtube")
                        .param("player_client", &["android", "web"])
                        .param("player_skip", &["webpage"])
                        .param("skip", &["hls", "dash"]),
                ),
                sleep_interval: Some(1),
                max_sleep_interval: Some(3),
            },
            Platform::TikTok => Self {
                output_template: format!("{dir}/%(title)s_%(id)s.%(ext)s"),
                format,
                extract_audio,
                audio_format: AUDIO_FORMAT.to_string(),
                audio_quality: AUDIO_QUALITY.to_string(),
                ignore_errors: true,
                verbose: false,
                headers: owned_headers(&[("User-Agent", TIKTOK_BROWSER_UA)]),
                extractor_args: None,
                sleep_interval: None,
                max_sleep_interval: None,
            },
        }
    }

    /// Copy of these options with an attempt layered on top: extractor args
    /// are replaced wholesale, headers are merged key by key. `self` is never
    /// mutated, so headers from one attempt do not carry into the next.
    pub fn with_attempt(&self, attempt: &ExtractionAttempt) -> Self {
        let mut merged = self.clone();
        if let Some(args) = &attempt.extractor_args {
            merged.extractor_args = Some(args.clone());
        }
        for (name, value) in &attempt.headers {
            merged.set_header(name, value);
        }
        merged
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Flags shared by metadata extraction and the download itself.
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--format".to_string(),
            self.format.clone(),
            "--output".to_string(),
            self.output_template.clone(),
        ];
        if self.ignore_errors {
            args.push("--ignore-errors".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        for (name, value) in &self.headers {
            args.push("--add-header".to_string());
            args.push(format!("{name}:{value}"));
        }
        if let Some(extractor_args) = &self.extractor_args {
            args.push("--extractor-args".to_string());
            args.push(extractor_args.render());
        }
        args
    }

    /// Arguments for a metadata-only run that prints one JSON document.
    pub fn metadata_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-single-json".to_string(), "--skip-download".to_string()];
        args.extend(self.common_args());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Arguments for the real download. `--print` implies quiet mode, so
    /// `--progress` is needed to keep the progress template lines coming.
    pub fn download_args(&self, url: &str) -> Vec<String> {
        let mut args = self.common_args();
        if let Some(interval) = self.sleep_interval {
            args.push("--sleep-interval".to_string());
            args.push(interval.to_string());
        }
        if let Some(interval) = self.max_sleep_interval {
            args.push("--max-sleep-interval".to_string());
            args.push(interval.to_string());
        }
        if self.extract_audio {
            args.extend([
                "--extract-audio".to_string(),
                "--audio-format".to_string(),
                self.audio_format.clone(),
                "--audio-quality".to_string(),
                self.audio_quality.clone(),
            ]);
        }
        args.extend([
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{PROGRESS_MARKER} %(progress._percent_str)s|%(progress._speed_str)s"
            ),
            "--no-simulate".to_string(),
            "--print".to_string(),
            format!("after_move:{SAVED_MARKER} %(filepath)s"),
            "--".to_string(),
            url.to_string(),
        ]);
        args
    }
}

fn owned_headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
