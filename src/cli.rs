//! Shared entry point of the per-site binaries.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use crate::config::{ConfigOverrides, resolve_job_config};
use crate::job;
use crate::logging;
use crate::platform::Platform;

/// Downloads the single URL named by `VIDEO_URL`. Everything else is read
/// from the environment or an env file; flags only override it.
#[derive(Debug, Parser)]
#[command(version)]
pub struct CliArgs {
    /// Directory for media and records (overrides OUTPUT_DIR).
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// yt-dlp executable (overrides YTDLP_PATH).
    #[arg(long = "yt-dlp")]
    pub ytdlp_program: Option<PathBuf>,

    /// JSON progress report path (overrides PROGRESS_FILE).
    #[arg(long = "progress-file")]
    pub progress_file: Option<PathBuf>,

    /// Env file consulted after the process environment.
    #[arg(long = "env-file")]
    pub env_file: Option<PathBuf>,
}

impl CliArgs {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            output_dir: self.output_dir,
            ytdlp_program: self.ytdlp_program,
            progress_file: self.progress_file,
            env_path: self.env_file,
        }
    }
}

pub async fn run(platform: Platform) -> ExitCode {
    let args = CliArgs::parse();
    logging::init();

    let config = match resolve_job_config(args.into_overrides()) {
        Ok(config) => config,
        Err(err) => {
            error!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match platform {
        Platform::YouTube => info!("YouTube Video Downloader"),
        Platform::TikTok => info!("TikTok Video Downloader"),
    }

    match job::run(platform, &config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            match platform {
                _ if !err.writes_record() => error!("Error: {err}"),
                Platform::YouTube => {
                    error!("Error downloading video: {}", platform.failure_message(&err))
                }
                Platform::TikTok => error!("Error downloading TikTok video: {err}"),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn no_flags_means_no_overrides() {
        let overrides = CliArgs::try_parse_from(["youtube_download"])
            .unwrap()
            .into_overrides();
        assert!(overrides.output_dir.is_none());
        assert!(overrides.ytdlp_program.is_none());
        assert!(overrides.progress_file.is_none());
        assert!(overrides.env_path.is_none());
    }

    #[test]
    fn flags_map_onto_overrides() {
        let overrides = CliArgs::try_parse_from([
            "tiktok_download",
            "--output-dir",
            "/srv/media",
            "--yt-dlp",
            "/opt/yt-dlp",
            "--progress-file=/tmp/progress.json",
            "--env-file",
            "job.env",
        ])
        .unwrap()
        .into_overrides();
        assert_eq!(overrides.output_dir, Some(PathBuf::from("/srv/media")));
        assert_eq!(overrides.ytdlp_program, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(
            overrides.progress_file,
            Some(PathBuf::from("/tmp/progress.json"))
        );
        assert_eq!(overrides.env_path, Some(PathBuf::from("job.env")));
    }

    #[test]
    fn positional_arguments_are_rejected() {
        assert!(CliArgs::try_parse_from(["youtube_download", "https://youtu.be/x"]).is_err());
    }
}
