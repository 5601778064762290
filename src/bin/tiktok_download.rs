#![forbid(unsafe_code)]

//! Fetches one TikTok video named by `VIDEO_URL`.

use std::process::ExitCode;

use mediafetch_tools::cli;
use mediafetch_tools::platform::Platform;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run(Platform::TikTok).await
}
