use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::cache::ArtifactCache;
use crate::core::downloader::Downloader;
use crate::core::error::LauncherResult;
use crate::core::http::build_http_client;
use crate::core::registry::{RegistryClient, MODRINTH_API_BASE};
use crate::core::resolver::DEFAULT_WORKERS;

const APP_DIR_NAME: &str = "interface";
const SETTINGS_FILE: &str = "launcher_settings.json";
const MODS_CONFIG_FILE: &str = "mods.json";
const MODS_CACHE_DIR: &str = "mods_cache";

/// Where everything lives on disk.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    /// The game directory (`.minecraft` equivalent).
    pub game_dir: PathBuf,
    /// Launcher-owned files, inside the game directory.
    pub config_dir: PathBuf,
}

impl LauncherPaths {
    pub fn new(game_dir: PathBuf) -> Self {
        let config_dir = game_dir.join(APP_DIR_NAME);
        Self {
            game_dir,
            config_dir,
        }
    }

    /// Platform default game directory.
    pub fn detect() -> Self {
        Self::new(default_game_dir())
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.game_dir.join("mods")
    }

    pub fn mods_cache_dir(&self) -> PathBuf {
        self.config_dir.join(MODS_CACHE_DIR)
    }

    pub fn mods_config_path(&self) -> PathBuf {
        self.config_dir.join(MODS_CONFIG_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    /// Requirements resolved in parallel.
    pub worker_count: usize,
    /// Budget for each registry call.
    pub request_timeout_secs: u64,
    /// Budget for each artifact download.
    pub download_timeout_secs: u64,
    /// Check published SHA-1 hashes of cached and downloaded artifacts.
    pub verify_hashes: bool,
    pub registry_base_url: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKERS,
            request_timeout_secs: 5,
            download_timeout_secs: 300,
            verify_hashes: false,
            registry_base_url: MODRINTH_API_BASE.to_string(),
        }
    }
}

impl LauncherSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs.max(1))
    }
}

pub struct AppState {
    pub paths: LauncherPaths,
    pub settings: LauncherSettings,
    pub http_client: Client,
    pub registry: Arc<RegistryClient>,
    pub downloader: Arc<Downloader>,
}

impl AppState {
    pub fn new(paths: LauncherPaths) -> LauncherResult<Self> {
        let settings = load_settings_from_disk(&paths.config_dir).unwrap_or_default();
        Self::with_settings(paths, settings)
    }

    pub fn with_settings(paths: LauncherPaths, settings: LauncherSettings) -> LauncherResult<Self> {
        let http_client = build_http_client()?;

        let registry = Arc::new(
            RegistryClient::new(http_client.clone())
                .with_base_url(settings.registry_base_url.clone())
                .with_timeout(settings.request_timeout()),
        );
        let downloader = Arc::new(
            Downloader::new(http_client.clone())
                .with_timeout(settings.download_timeout())
                .with_hash_verification(settings.verify_hashes),
        );

        debug!("Launcher state at {:?}", paths.config_dir);

        Ok(Self {
            paths,
            settings,
            http_client,
            registry,
            downloader,
        })
    }

    pub fn artifact_cache(&self) -> ArtifactCache {
        ArtifactCache::new(self.paths.mods_cache_dir())
    }

    pub fn save_settings(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.paths.config_dir)?;
        let json = serde_json::to_string_pretty(&self.settings)?;
        std::fs::write(self.paths.settings_path(), json)
    }
}

fn load_settings_from_disk(config_dir: &Path) -> Option<LauncherSettings> {
    let path = config_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring corrupt {:?}: {}", path, e);
            None
        }
    }
}

fn default_game_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

    if cfg!(target_os = "windows") {
        dirs::config_dir()
            .map(|appdata| appdata.join(".minecraft"))
            .unwrap_or_else(|| home.join(".minecraft"))
    } else if cfg!(target_os = "macos") {
        home.join("Library")
            .join("Application Support")
            .join("minecraft")
    } else {
        home.join(".minecraft")
    }
}
