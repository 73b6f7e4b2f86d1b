// ─── Mods Installer ───
// Rebuilds the game's `mods/` folder from a resolved closure. Only files
// with the managed extension are touched; configs, READMEs and anything
// else the user dropped there survive.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

/// Extension of the files this engine owns inside the mods directory.
pub const MANAGED_EXTENSION: &str = "jar";

pub struct ModsInstaller {
    mods_dir: PathBuf,
}

impl ModsInstaller {
    pub fn new(mods_dir: PathBuf) -> Self {
        Self { mods_dir }
    }

    pub fn mods_dir(&self) -> &Path {
        &self.mods_dir
    }

    /// Make the mods directory hold exactly `files` among managed files.
    ///
    /// Destructive rebuild: every managed file is removed, then every
    /// resolved file is copied in. The two phases are not atomic; a crash
    /// in between leaves a partially populated directory that the next
    /// run rebuilds. Returns the installed paths.
    pub async fn reconcile(&self, files: &BTreeSet<PathBuf>) -> LauncherResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.mods_dir)
            .await
            .map_err(|source| self.install_error(&self.mods_dir, source))?;

        let removed = self.clear_managed().await?;
        debug!("Removed {} managed file(s) from {:?}", removed, self.mods_dir);

        let mut installed = Vec::with_capacity(files.len());
        for src in files {
            let Some(name) = src.file_name() else {
                continue;
            };
            let dest = self.mods_dir.join(name);
            tokio::fs::copy(src, &dest)
                .await
                .map_err(|source| self.install_error(&dest, source))?;
            installed.push(dest);
        }

        info!("Copied {} mod(s) into {:?}", installed.len(), self.mods_dir);
        Ok(installed)
    }

    /// Delete every managed file directly inside the mods directory.
    async fn clear_managed(&self) -> LauncherResult<usize> {
        let mut entries = tokio::fs::read_dir(&self.mods_dir)
            .await
            .map_err(|source| self.install_error(&self.mods_dir, source))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| self.install_error(&self.mods_dir, source))?
        {
            let path = entry.path();
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if is_file && is_managed(&path) {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|source| self.install_error(&path, source))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn install_error(&self, path: &Path, source: std::io::Error) -> LauncherError {
        LauncherError::Install {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn is_managed(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == MANAGED_EXTENSION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn reconcile_replaces_stale_jars_and_keeps_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = tmp.path().join("cache");
        let mods = tmp.path().join("mods");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::create_dir_all(mods.join("subfolder")).unwrap();

        std::fs::write(cache.join("sodium.jar"), b"sodium").unwrap();
        std::fs::write(cache.join("fabric-api.jar"), b"fabric-api").unwrap();
        std::fs::write(mods.join("optifine.jar"), b"stale").unwrap();
        std::fs::write(mods.join("sodium.jar"), b"old sodium").unwrap();
        std::fs::write(mods.join("notes.txt"), b"keep me").unwrap();
        std::fs::write(mods.join("config.json"), b"{}").unwrap();

        let files: BTreeSet<PathBuf> =
            [cache.join("sodium.jar"), cache.join("fabric-api.jar")].into();
        let installed = ModsInstaller::new(mods.clone())
            .reconcile(&files)
            .await
            .unwrap();

        assert_eq!(installed.len(), 2);
        assert_eq!(
            names(&mods),
            vec!["config.json", "fabric-api.jar", "notes.txt", "sodium.jar", "subfolder"]
        );
        assert_eq!(std::fs::read(mods.join("sodium.jar")).unwrap(), b"sodium");
        assert_eq!(std::fs::read(mods.join("notes.txt")).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn reconcile_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let mods = tmp.path().join("minecraft").join("mods");

        let installed = ModsInstaller::new(mods.clone())
            .reconcile(&BTreeSet::new())
            .await
            .unwrap();

        assert!(installed.is_empty());
        assert!(mods.is_dir());
    }

    #[tokio::test]
    async fn empty_closure_clears_managed_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("old.jar"), b"x").unwrap();
        std::fs::write(tmp.path().join("old.jar.disabled"), b"x").unwrap();

        ModsInstaller::new(tmp.path().to_path_buf())
            .reconcile(&BTreeSet::new())
            .await
            .unwrap();

        assert_eq!(names(tmp.path()), vec!["old.jar.disabled"]);
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_install_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("mods");
        std::fs::write(&blocker, b"a file where the directory should be").unwrap();

        let err = ModsInstaller::new(blocker)
            .reconcile(&BTreeSet::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::Install { .. }));
    }
}
