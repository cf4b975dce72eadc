//! Audio acquisition utilities.

mod downloader;

pub use downloader::{download_audio, locate_audio, DownloadOptions, ScratchDir};
