// Launcher-facing operations. The desktop shell and the CLI call these;
// everything below them lives in `core`.

use std::path::PathBuf;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult, ResolutionFailure};
use crate::core::installer::ModsInstaller;
use crate::core::registry::{ModRegistry, ModSummary};
use crate::core::resolver::{file_names, DependencyResolver};
use crate::core::state::{AppState, ModsConfig};
use crate::core::version::{LoaderType, VersionIdentity};

/// Outcome of preparing the mods folder for a launch.
#[derive(Debug, Serialize)]
pub struct PrepareReport {
    pub game_version: String,
    pub loader: LoaderType,
    /// Files now present in the mods directory.
    pub installed: Vec<PathBuf>,
    /// Requirements left out, with the reason.
    pub failures: Vec<ResolutionFailure>,
}

/// Resolve the enabled mods for `game_version` / `loader`, fill the cache
/// and rebuild the mods directory.
///
/// Per-mod problems are reported in [`PrepareReport::failures`]. Only an
/// unreadable selection, an unusable cache or an unwritable mods directory
/// is an error. A cancelled run leaves the mods directory untouched.
pub async fn prepare_mods(
    state: &AppState,
    game_version: &str,
    loader: LoaderType,
    cancel: &CancellationToken,
) -> LauncherResult<PrepareReport> {
    info!("Loading mods for {} ({})", game_version, loader);

    let selection = ModsConfig::load(&state.paths.mods_config_path()).await?;
    let cache_dir = state
        .artifact_cache()
        .ensure_partition(game_version, loader)
        .await?;

    let resolver = DependencyResolver::new(state.registry.clone(), state.downloader.clone())
        .with_concurrency(state.settings.worker_count);
    let report = resolver
        .resolve(
            selection.requirements(),
            game_version,
            loader,
            &cache_dir,
            cancel,
        )
        .await;

    if cancel.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }

    for failure in &report.failures {
        warn!("Mod not installed: {}", failure);
    }

    let installer = ModsInstaller::new(state.paths.mods_dir());
    let installed = installer.reconcile(&report.files).await?;

    info!("Mods ready: {}", file_names(&report).join(", "));

    Ok(PrepareReport {
        game_version: game_version.to_string(),
        loader,
        installed,
        failures: report.failures,
    })
}

/// Launch-time entry point: classify the installed version id and prepare
/// its mods. Vanilla versions have nothing to prepare.
pub async fn prepare_mods_for_version(
    state: &AppState,
    version_id: &str,
    cancel: &CancellationToken,
) -> LauncherResult<Option<PrepareReport>> {
    let identity = VersionIdentity::parse(version_id);
    if !identity.loader.supports_mods() {
        info!("{} runs without mods, skipping mod preparation", identity);
        return Ok(None);
    }

    prepare_mods(state, &identity.game_version, identity.loader, cancel)
        .await
        .map(Some)
}

pub async fn search_mods(state: &AppState, query: &str) -> LauncherResult<Vec<ModSummary>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    state.registry.search(query).await
}

/// Add a mod to the enabled selection. Returns `false` if it was already there.
pub async fn enable_mod(state: &AppState, summary: ModSummary) -> LauncherResult<bool> {
    let path = state.paths.mods_config_path();
    let mut selection = ModsConfig::load(&path).await?;
    let title = summary.title.clone();
    let added = selection.enable(summary);
    if added {
        selection.save(&path).await?;
        info!("Enabled mod '{}'", title);
    }
    Ok(added)
}

/// Remove a mod from the enabled selection. Returns `false` if it was not there.
pub async fn disable_mod(state: &AppState, project_id: &str) -> LauncherResult<bool> {
    let path = state.paths.mods_config_path();
    let mut selection = ModsConfig::load(&path).await?;
    let removed = selection.disable(project_id);
    if removed {
        selection.save(&path).await?;
        info!("Disabled mod {}", project_id);
    }
    Ok(removed)
}

pub async fn list_enabled_mods(state: &AppState) -> LauncherResult<Vec<ModSummary>> {
    Ok(ModsConfig::load(&state.paths.mods_config_path())
        .await?
        .enabled_mods)
}

/// Artifact filenames already cached for a game version / loader pair.
pub async fn cached_mods(
    state: &AppState,
    game_version: &str,
    loader: LoaderType,
) -> LauncherResult<Vec<String>> {
    state
        .artifact_cache()
        .list_partition(game_version, loader)
        .await
}
