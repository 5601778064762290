#![forbid(unsafe_code)]

//! Fetches one YouTube video (or its audio) named by `VIDEO_URL`, trying the
//! android, ios and desktop clients in turn.

use std::process::ExitCode;

use mediafetch_tools::cli;
use mediafetch_tools::platform::Platform;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run(Platform::YouTube).await
}
