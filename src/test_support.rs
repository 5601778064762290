//! Shell stubs that stand in for yt-dlp during tests.

use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::Result;

pub const STUB_VERSION: &str = "2025.01.15";
const CALLS_LOG: &str = "calls.log";

/// Writes an executable `yt-dlp` stub into `dir`. `--version` is answered
/// up front; every other invocation is appended to `calls.log` before `body`
/// runs.
pub fn install_stub(dir: &Path, body: &str) -> Result<PathBuf> {
    let script_path = dir.join("yt-dlp");
    let script = format!(
        r#"#!/usr/bin/env bash
set -eu
if [[ "${{1:-}}" == "--version" ]]; then
  echo "{STUB_VERSION}"
  exit 0
fi
printf '%s\n' "$*" >> "$(dirname "$0")/{CALLS_LOG}"
{body}"#
    );
    fs::write(&script_path, script)?;
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&script_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms)?;
    }
    Ok(script_path)
}

/// Every non-`--version` invocation the stub saw, one line per call.
pub fn read_calls(dir: &Path) -> Result<Vec<String>> {
    let path = dir.join(CALLS_LOG);
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::to_owned)
        .collect())
}
