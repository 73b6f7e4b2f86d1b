// ─── Artifact Cache ───
// Flat, filename-keyed store of downloaded mod artifacts, partitioned by
// game version and loader: `<root>/<game_version>-<loader>/<filename>`.
// Entries are never evicted; presence is the only existence check.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::LoaderType;

#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every artifact valid for this game version / loader.
    pub fn partition_dir(&self, game_version: &str, loader: LoaderType) -> PathBuf {
        self.root.join(format!("{}-{}", game_version, loader))
    }

    /// Path of `filename` inside its partition. Names that would leave the
    /// partition are rejected.
    pub fn entry_path(
        &self,
        game_version: &str,
        loader: LoaderType,
        filename: &str,
    ) -> LauncherResult<PathBuf> {
        let name = checked_file_name(filename)?;
        Ok(self.partition_dir(game_version, loader).join(name))
    }

    pub fn contains(&self, game_version: &str, loader: LoaderType, filename: &str) -> bool {
        self.entry_path(game_version, loader, filename)
            .map(|p| p.try_exists().unwrap_or(false))
            .unwrap_or(false)
    }

    /// Create the partition directory if needed (`mkdir -p` semantics).
    pub async fn ensure_partition(
        &self,
        game_version: &str,
        loader: LoaderType,
    ) -> LauncherResult<PathBuf> {
        let dir = self.partition_dir(game_version, loader);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: dir.clone(),
                source,
            })?;
        debug!("Cache partition ready: {:?}", dir);
        Ok(dir)
    }

    /// Cached artifact filenames of one partition, sorted. A missing
    /// partition is simply empty.
    pub async fn list_partition(
        &self,
        game_version: &str,
        loader: LoaderType,
    ) -> LauncherResult<Vec<String>> {
        let dir = self.partition_dir(game_version, loader);
        let mut names = Vec::new();

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(source) => return Err(LauncherError::Io { path: dir, source }),
        };

        while let Some(entry) = entries.next_entry().await.map_err(|source| LauncherError::Io {
            path: dir.clone(),
            source,
        })? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().to_string();
            // In-progress downloads are hidden dot-files.
            if is_file && !name.starts_with('.') {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Accept `name` only if it is exactly one normal path component, so
/// joining it onto a partition stays inside that partition.
pub fn checked_file_name(name: &str) -> LauncherResult<&str> {
    if Path::new(name).file_name() == Some(OsStr::new(name)) {
        Ok(name)
    } else {
        Err(LauncherError::UnsafeFileName(name.to_string()))
    }
}
