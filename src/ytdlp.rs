//! Thin async driver around the `yt-dlp` executable.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::DownloaderError;
use crate::info::VideoInfo;
use crate::options::{DownloadOptions, PROGRESS_MARKER, SAVED_MARKER};

pub const DEFAULT_YTDLP_PROGRAM: &str = "yt-dlp";

/// Something worth reporting while a download runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Progress {
        percent: String,
        speed: String,
        /// Parsed from `percent` when it looks like `42.0%`.
        fraction: Option<f64>,
    },
    Finished {
        path: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.stdin(Stdio::null()).kill_on_drop(true);
        command
    }

    /// Runs `--version`, failing loudly when yt-dlp is missing or broken.
    pub async fn version(&self) -> Result<String, DownloaderError> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .await
            .map_err(|source| DownloaderError::NotInstalled {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(DownloaderError::Unhealthy {
                program: self.program.clone(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Fetches metadata without downloading. The child is killed when
    /// `timeout` elapses.
    pub async fn extract_info(
        &self,
        url: &str,
        options: &DownloadOptions,
        timeout: Duration,
    ) -> Result<VideoInfo, DownloaderError> {
        let mut command = self.command();
        command.args(options.metadata_args(url));

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| DownloaderError::Timeout(timeout))??;

        if !output.stderr.is_empty() {
            debug!(stderr = %String::from_utf8_lossy(&output.stderr), "yt-dlp metadata stderr");
        }
        if !output.status.success() {
            return Err(DownloaderError::Failed(failure_message(
                &output.stderr,
                output.status,
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        // With --ignore-errors a failed extraction can exit 0 and print
        // `null` or nothing at all.
        let trimmed = stdout.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(DownloaderError::Failed(format!(
                "no metadata returned for {url}: {}",
                failure_message(&output.stderr, output.status)
            )));
        }
        Ok(serde_json::from_str(trimmed)?)
    }

    /// Downloads the media, forwarding progress and completion lines to
    /// `on_event`. Returns the final file path when yt-dlp reported one.
    pub async fn download<F>(
        &self,
        url: &str,
        options: &DownloadOptions,
        mut on_event: F,
    ) -> Result<Option<PathBuf>, DownloaderError>
    where
        F: FnMut(&DownloadEvent),
    {
        let mut child = self
            .command()
            .args(options.download_args(url))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloaderError::Failed("could not capture yt-dlp stdout".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloaderError::Failed("could not capture yt-dlp stderr".into()))?;

        // Verbose mode writes a lot to stderr; drain it concurrently so the
        // child never blocks on a full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        });

        let mut saved = None;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_download_line(&line) {
                Some(event) => {
                    if let DownloadEvent::Finished { path } = &event {
                        saved = Some(path.clone());
                    }
                    on_event(&event);
                }
                None => debug!(line = %line, "yt-dlp output"),
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task.await {
            Ok(Ok(buf)) => buf,
            Ok(Err(err)) => return Err(err.into()),
            Err(err) => {
                return Err(DownloaderError::Failed(format!(
                    "stderr reader failed: {err}"
                )));
            }
        };
        if !stderr.is_empty() {
            debug!(stderr = %String::from_utf8_lossy(&stderr), "yt-dlp download stderr");
        }

        if !status.success() {
            return Err(DownloaderError::Failed(failure_message(&stderr, status)));
        }
        Ok(saved)
    }
}

/// Picks the line that best explains a failure: the last `ERROR:` line,
/// otherwise the last non-empty one, otherwise the exit status.
pub fn failure_message(stderr: &[u8], status: ExitStatus) -> String {
    let text = String::from_utf8_lossy(stderr);
    let mut last_line = None;
    let mut last_error = None;
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.starts_with("ERROR:") {
            last_error = Some(line);
        }
        last_line = Some(line);
    }
    last_error
        .or(last_line)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("yt-dlp exited with {status}"))
}

/// Recognizes the marker lines requested by `DownloadOptions::download_args`.
pub fn parse_download_line(line: &str) -> Option<DownloadEvent> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(PROGRESS_MARKER) {
        let (percent, speed) = rest.split_once('|')?;
        let percent = percent.trim().to_string();
        let fraction = percent
            .strip_suffix('%')
            .and_then(|value| value.trim().parse::<f64>().ok());
        return Some(DownloadEvent::Progress {
            percent,
            speed: speed.trim().to_string(),
            fraction,
        });
    }
    let path = line.strip_prefix(SAVED_MARKER)?.trim();
    if path.is_empty() {
        return None;
    }
    Some(DownloadEvent::Finished {
        path: PathBuf::from(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download_type::DownloadType;
    use crate::platform::Platform;
    use crate::test_support::{STUB_VERSION, install_stub};
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }

    fn tiktok_options(dir: &Path) -> DownloadOptions {
        DownloadOptions::for_platform(Platform::TikTok, DownloadType::Video, dir)
    }

    #[test]
    fn parse_progress_lines() {
        assert_eq!(
            parse_download_line("[progress]  42.5%|1.20MiB/s"),
            Some(DownloadEvent::Progress {
                percent: "42.5%".into(),
                speed: "1.20MiB/s".into(),
                fraction: Some(42.5),
            })
        );
        assert_eq!(
            parse_download_line("[progress] N/A|Unknown B/s"),
            Some(DownloadEvent::Progress {
                percent: "N/A".into(),
                speed: "Unknown B/s".into(),
                fraction: None,
            })
        );
        assert_eq!(parse_download_line("[progress] garbage"), None);
    }

    #[test]
    fn parse_saved_lines() {
        assert_eq!(
            parse_download_line("[saved] downloads/My Clip.mp4"),
            Some(DownloadEvent::Finished {
                path: PathBuf::from("downloads/My Clip.mp4")
            })
        );
        assert_eq!(parse_download_line("[saved]   "), None);
        assert_eq!(parse_download_line("[download] Destination: x.mp4"), None);
    }

    #[cfg(unix)]
    #[test]
    fn failure_message_prefers_error_lines() {
        let stderr = b"[debug] something\nERROR: [youtube] x: Video unavailable\nWARNING: trailing\n";
        assert_eq!(
            failure_message(stderr, exit_status(1)),
            "ERROR: [youtube] x: Video unavailable"
        );
        assert_eq!(
            failure_message(b"\nplain failure\n\n", exit_status(1)),
            "plain failure"
        );
        assert!(failure_message(b"", exit_status(2)).starts_with("yt-dlp exited with"));
    }

    #[tokio::test]
    async fn version_reports_stub_version() -> Result<()> {
        let temp = tempdir()?;
        let stub = install_stub(temp.path(), "exit 0\n")?;
        assert_eq!(YtDlp::new(&stub).version().await?, STUB_VERSION);
        Ok(())
    }

    #[tokio::test]
    async fn version_reports_missing_program() -> Result<()> {
        let temp = tempdir()?;
        let err = YtDlp::new(temp.path().join("missing-yt-dlp"))
            .version()
            .await
            .unwrap_err();
        assert!(matches!(err, DownloaderError::NotInstalled { .. }));
        assert!(!err.is_download_error());
        Ok(())
    }

    #[tokio::test]
    async fn extract_info_parses_stdout() -> Result<()> {
        let temp = tempdir()?;
        let stub = install_stub(
            temp.path(),
            r#"echo '[debug] noise' >&2
printf '%s\n' '{"id":"7301","title":"Dance","duration":15,"uploader":"creator"}'
"#,
        )?;
        let info = YtDlp::new(&stub)
            .extract_info(
                "https://www.tiktok.com/@creator/video/7301",
                &tiktok_options(temp.path()),
                Duration::from_secs(10),
            )
            .await?;
        assert_eq!(info.id.as_deref(), Some("7301"));
        assert_eq!(info.uploader.as_deref(), Some("creator"));
        Ok(())
    }

    #[tokio::test]
    async fn extract_info_surfaces_stderr_on_failure() -> Result<()> {
        let temp = tempdir()?;
        let stub = install_stub(
            temp.path(),
            "echo 'ERROR: [TikTok] 7301: Unable to extract webpage video data' >&2\nexit 1\n",
        )?;
        let err = YtDlp::new(&stub)
            .extract_info(
                "https://www.tiktok.com/@creator/video/7301",
                &tiktok_options(temp.path()),
                Duration::from_secs(10),
            )
            .await
            .unwrap_err();
        assert!(err.is_download_error());
        assert_eq!(
            err.to_string(),
            "ERROR: [TikTok] 7301: Unable to extract webpage video data"
        );
        Ok(())
    }

    #[tokio::test]
    async fn extract_info_rejects_null_output() -> Result<()> {
        let temp = tempdir()?;
        let stub = install_stub(temp.path(), "echo null\n")?;
        let err = YtDlp::new(&stub)
            .extract_info(
                "https://www.tiktok.com/@creator/video/7301",
                &tiktok_options(temp.path()),
                Duration::from_secs(10),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("no metadata returned"));
        Ok(())
    }

    #[tokio::test]
    async fn extract_info_reports_bad_json() -> Result<()> {
        let temp = tempdir()?;
        let stub = install_stub(temp.path(), "echo '{not json'\n")?;
        let err = YtDlp::new(&stub)
            .extract_info(
                "https://www.tiktok.com/@creator/video/7301",
                &tiktok_options(temp.path()),
                Duration::from_secs(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DownloaderError::Parse(_)));
        Ok(())
    }

    #[tokio::test]
    async fn extract_info_times_out() -> Result<()> {
        let temp = tempdir()?;
        let stub = install_stub(temp.path(), "sleep 5\n")?;
        let err = YtDlp::new(&stub)
            .extract_info(
                "https://www.tiktok.com/@creator/video/7301",
                &tiktok_options(temp.path()),
                Duration::from_millis(200),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DownloaderError::Timeout(_)));
        Ok(())
    }

    #[tokio::test]
    async fn download_streams_progress_and_final_path() -> Result<()> {
        let temp = tempdir()?;
        let target = temp.path().join("Dance_7301.mp4");
        let stub = install_stub(
            temp.path(),
            &format!(
                r#"echo '[debug] verbose chatter' >&2
echo '[progress]  10.0%|1.00MiB/s'
echo '[download] unrelated line'
echo '[progress] 100.0%|2.00MiB/s'
echo video > '{path}'
echo '[saved] {path}'
"#,
                path = target.display()
            ),
        )?;

        let mut events = Vec::new();
        let saved = YtDlp::new(&stub)
            .download(
                "https://www.tiktok.com/@creator/video/7301",
                &tiktok_options(temp.path()),
                |event| events.push(event.clone()),
            )
            .await?;

        assert_eq!(saved.as_deref(), Some(target.as_path()));
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            DownloadEvent::Progress { fraction: Some(f), .. } if (*f - 100.0).abs() < f64::EPSILON
        ));
        assert_eq!(fs::read_to_string(&target)?, "video\n");
        Ok(())
    }

    #[tokio::test]
    async fn download_failure_carries_error_line() -> Result<()> {
        let temp = tempdir()?;
        let stub = install_stub(
            temp.path(),
            "echo '[progress]   5.0%|1.00MiB/s'\necho 'ERROR: unable to download video data: HTTP Error 403: Forbidden' >&2\nexit 1\n",
        )?;
        let err = YtDlp::new(&stub)
            .download(
                "https://www.tiktok.com/@creator/video/7301",
                &tiktok_options(temp.path()),
                |_| {},
            )
            .await
            .unwrap_err();
        assert!(err.is_download_error());
        assert!(err.to_string().contains("HTTP Error 403"));
        Ok(())
    }
}
