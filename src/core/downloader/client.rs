use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::cache::checked_file_name;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::registry::ResolvedVersion;

/// Default budget for a single artifact transfer.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Puts a resolved artifact into a cache directory.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Return the path of `version.filename` inside `cache_dir`,
    /// downloading it first when it is not there yet.
    async fn ensure_cached(
        &self,
        version: &ResolvedVersion,
        cache_dir: &Path,
    ) -> LauncherResult<PathBuf>;
}

/// Streaming downloader writing through a temp file and an atomic rename.
pub struct Downloader {
    client: Client,
    timeout: Duration,
    /// Check published SHA-1 hashes on download and on cache hits.
    verify_hashes: bool,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            verify_hashes: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_hash_verification(mut self, enabled: bool) -> Self {
        self.verify_hashes = enabled;
        self
    }

    // ── Single file download ────────────────────────────

    /// Download `url` to `dest`, optionally validating SHA-1.
    ///
    /// The body is streamed into a hidden temp file next to `dest` and
    /// renamed into place only once complete, so `dest` is either absent
    /// or whole. The temp file is removed on any failure, including the
    /// future being dropped mid-transfer.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
    ) -> LauncherResult<()> {
        let parent = dest
            .parent()
            .ok_or_else(|| LauncherError::Other(format!("No parent directory for {:?}", dest)))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;

        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(|e| LauncherError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?
            .into_temp_path();

        let mut hasher = Sha1::new();
        let mut written: u64 = 0;

        // Write inside a block so the handle is closed before the rename.
        {
            let mut file = tokio::fs::File::create(&temp)
                .await
                .map_err(|e| LauncherError::Io {
                    path: temp.to_path_buf(),
                    source: e,
                })?;

            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                hasher.update(&chunk);
                file.write_all(&chunk).await.map_err(|e| LauncherError::Io {
                    path: temp.to_path_buf(),
                    source: e,
                })?;
                written += chunk.len() as u64;
            }

            file.flush().await.map_err(|e| LauncherError::Io {
                path: temp.to_path_buf(),
                source: e,
            })?;
        }

        if let Some(expected) = sha1_expected {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        temp.persist(dest).map_err(|e| LauncherError::Io {
            path: dest.to_path_buf(),
            source: e.error,
        })?;

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(())
    }

    /// Validate an existing file's SHA-1.
    pub async fn validate_sha1(path: &Path, expected: &str) -> LauncherResult<bool> {
        let bytes = tokio::fs::read(path).await.map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut hasher = Sha1::new();
        hasher.update(&bytes);
        let actual = hex::encode(hasher.finalize());
        Ok(actual.eq_ignore_ascii_case(expected))
    }
}

#[async_trait]
impl ArtifactFetcher for Downloader {
    async fn ensure_cached(
        &self,
        version: &ResolvedVersion,
        cache_dir: &Path,
    ) -> LauncherResult<PathBuf> {
        let dest = cache_dir.join(checked_file_name(&version.filename)?);
        let expected = if self.verify_hashes {
            version.content_hash.as_deref()
        } else {
            None
        };

        if dest.try_exists().unwrap_or(false) {
            let intact = match expected {
                Some(hash) => Self::validate_sha1(&dest, hash).await?,
                None => true,
            };
            if intact {
                debug!("Cache hit: {:?}", dest);
                return Ok(dest);
            }
            warn!("Cached {:?} fails its SHA-1 check, downloading again", dest);
        }

        info!("Downloading {} to {:?}", version.filename, dest);
        self.download_file(&version.download_url, &dest, expected)
            .await?;
        Ok(dest)
    }
}
