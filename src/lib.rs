#![forbid(unsafe_code)]

//! Shared pieces of the single-URL media fetchers.
//!
//! Each binary handles exactly one URL: it resolves its settings from the
//! environment, drives `yt-dlp` through a fixed list of client-emulation
//! attempts, downloads the media and leaves a JSON record (success or
//! failure) next to it.

pub mod cli;
pub mod config;
pub mod download_type;
pub mod error;
pub mod info;
pub mod job;
pub mod logging;
pub mod options;
pub mod platform;
pub mod progress;
pub mod records;
pub mod strategy;
pub mod ytdlp;

#[cfg(test)]
pub(crate) mod test_support;
