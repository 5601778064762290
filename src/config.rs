#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::download_type::DEFAULT_DOWNLOAD_TYPE;
use crate::ytdlp::DEFAULT_YTDLP_PROGRAM;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 120;

/// Everything one fetch needs to know.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub video_url: String,
    /// Raw `DOWNLOAD_TYPE`, echoed verbatim into records.
    pub download_type: String,
    pub timestamp: String,
    pub output_dir: PathBuf,
    pub ytdlp_program: PathBuf,
    pub progress_file: Option<PathBuf>,
    pub attempt_timeout: Duration,
}

/// Command-line values that win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_dir: Option<PathBuf>,
    pub ytdlp_program: Option<PathBuf>,
    pub progress_file: Option<PathBuf>,
    pub env_path: Option<PathBuf>,
}

/// Resolves with precedence: override, process environment, env file, default.
pub fn resolve_job_config(overrides: ConfigOverrides) -> Result<JobConfig> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_job_config_with_overrides(&file_vars, env_var_string, overrides, local_timestamp)
}

/// ISO-8601 local time with microseconds, e.g. `2024-03-09T07:05:01.123456`.
pub fn local_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

#[cfg(test)]
fn build_job_config(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<JobConfig> {
    build_job_config_with_overrides(file_vars, env_lookup, ConfigOverrides::default(), || {
        "2024-01-01T00:00:00.000000".to_string()
    })
}

fn build_job_config_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: ConfigOverrides,
    now: impl FnOnce() -> String,
) -> Result<JobConfig> {
    let video_url = lookup_value("VIDEO_URL", file_vars, &env_lookup)
        .ok_or_else(|| anyhow!("VIDEO_URL environment variable not set"))?;
    let download_type = lookup_value("DOWNLOAD_TYPE", file_vars, &env_lookup)
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_TYPE.to_string());
    let timestamp = lookup_value("TIMESTAMP", file_vars, &env_lookup).unwrap_or_else(now);
    let output_dir = overrides
        .output_dir
        .or_else(|| lookup_value("OUTPUT_DIR", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let ytdlp_program = overrides
        .ytdlp_program
        .or_else(|| lookup_value("YTDLP_PATH", file_vars, &env_lookup).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP_PROGRAM));
    let progress_file = overrides
        .progress_file
        .or_else(|| lookup_value("PROGRESS_FILE", file_vars, &env_lookup).map(PathBuf::from));
    let attempt_timeout = lookup_value("ATTEMPT_TIMEOUT_SECS", file_vars, &env_lookup)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS));

    Ok(JobConfig {
        video_url,
        download_type,
        timestamp,
        output_dir,
        ytdlp_program,
        progress_file,
        attempt_timeout,
    })
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Whitespace-only values count as unset; anything else is kept as given.
fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key)
        .and_then(non_blank)
        .or_else(|| file_vars.get(key).cloned().and_then(non_blank))
}

/// Parses a dotenv-style file. Comments, blank lines and lines without `=`
/// are skipped; a missing file yields no variables.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), unquote(value_raw.trim()).to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(value)
}
