mod client;

pub use client::{ArtifactFetcher, Downloader, DEFAULT_DOWNLOAD_TIMEOUT};
